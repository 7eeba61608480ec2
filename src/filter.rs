//! Row selection over the unified table.
//!
//! [`FilterSelection`] carries the sidebar-style choices (roles, work modes,
//! segments, an hours range); [`FilterCondition`] carries ad-hoc
//! `column op value` expressions. Both are AND-combined by [`apply_filters`].

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow, ensure};
use itertools::{Itertools, MinMaxResult};
use log::{debug, warn};

use crate::{
    cli::FilterArgs,
    data::{Value, parse_typed_value},
    dataset::{Dataset, DatasetView},
    record::{CanonicalRecord, ColumnName, WorkMode},
};

/// Inclusive range of weekly hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoursRange {
    pub low: f64,
    pub high: f64,
}

impl HoursRange {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        ensure!(
            low <= high,
            "Hours range is inverted: minimum {low} exceeds maximum {high}"
        );
        Ok(Self { low, high })
    }

    pub fn contains(&self, hours: f64) -> bool {
        hours >= self.low && hours <= self.high
    }
}

/// An empty set matches every row. `segments: None` disables segment
/// filtering altogether.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub roles: BTreeSet<String>,
    pub work_modes: BTreeSet<WorkMode>,
    pub segments: Option<BTreeSet<String>>,
    pub hours: Option<HoursRange>,
}

impl FilterSelection {
    /// Selects every available value; applying it returns every row.
    ///
    /// Segment filtering stays off: rows from sources without a segment have
    /// no value to select, and a full segment set would drop them.
    pub fn select_all(options: &FilterOptions) -> Self {
        Self {
            roles: options.roles.iter().cloned().collect(),
            work_modes: options.work_modes.iter().copied().collect(),
            segments: None,
            hours: options.hours,
        }
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        let base = &record.base;
        if !self.roles.is_empty() && !self.roles.contains(&base.role) {
            return false;
        }
        if !self.work_modes.is_empty() && !self.work_modes.contains(&base.work_mode) {
            return false;
        }
        if let Some(segments) = self.segments.as_ref().filter(|s| !s.is_empty()) {
            match &base.segment {
                Some(segment) if segments.contains(segment) => {}
                _ => return false,
            }
        }
        self.hours
            .is_none_or(|range| range.contains(base.hours_per_week))
    }
}

/// Distinct values available for selection, as a sidebar would list them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub roles: Vec<String>,
    pub work_modes: Vec<WorkMode>,
    pub segments: Vec<String>,
    pub hours: Option<HoursRange>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::from_view(&dataset.view())
    }

    pub fn from_view(view: &DatasetView<'_>) -> Self {
        let roles = view
            .iter()
            .map(|r| r.base.role.clone())
            .sorted()
            .dedup()
            .collect();
        let work_modes = view.iter().map(|r| r.base.work_mode).sorted().dedup().collect();
        let segments = view
            .iter()
            .filter_map(|r| r.base.segment.clone())
            .sorted()
            .dedup()
            .collect();
        let hours = match view
            .iter()
            .map(|r| r.base.hours_per_week)
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(h) => Some(HoursRange { low: h, high: h }),
            MinMaxResult::MinMax(low, high) => Some(HoursRange { low, high }),
        };
        Self {
            roles,
            work_modes,
            segments,
            hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: ColumnName,
    pub operator: ComparisonOperator,
    pub operand: Option<Value>,
    pub raw_value: String,
}

const OPERATORS: [(&str, ComparisonOperator); 9] = [
    (" contains ", ComparisonOperator::Contains),
    (" startswith ", ComparisonOperator::StartsWith),
    (" endswith ", ComparisonOperator::EndsWith),
    ("!=", ComparisonOperator::NotEq),
    (">=", ComparisonOperator::Ge),
    ("<=", ComparisonOperator::Le),
    ("=", ComparisonOperator::Eq),
    (">", ComparisonOperator::Gt),
    ("<", ComparisonOperator::Lt),
];

pub fn parse_conditions(expressions: &[String]) -> Result<Vec<FilterCondition>> {
    expressions.iter().map(|e| parse_condition(e)).collect()
}

pub fn parse_condition(expression: &str) -> Result<FilterCondition> {
    let trimmed = expression.trim();
    ensure!(!trimmed.is_empty(), "Empty filter expression");

    // Split at the leftmost operator; at equal positions the longer one wins
    // so `>=` is not read as `>`.
    let lowered = trimmed.to_ascii_lowercase();
    let found = OPERATORS
        .iter()
        .filter_map(|(needle, op)| {
            let haystack = if needle.starts_with(' ') { lowered.as_str() } else { trimmed };
            haystack.find(needle).map(|idx| (idx, *needle, *op))
        })
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.len().cmp(&a.1.len())));
    if let Some((idx, needle, op)) = found {
        return build_condition(&trimmed[..idx], op, &trimmed[idx + needle.len()..]);
    }

    Err(anyhow!("Failed to parse filter expression '{trimmed}'"))
}

fn build_condition(column: &str, operator: ComparisonOperator, value: &str) -> Result<FilterCondition> {
    let column: ColumnName = column.trim().parse()?;
    let raw_value = unquote(value.trim()).to_string();
    let operand = match operator {
        ComparisonOperator::Contains
        | ComparisonOperator::StartsWith
        | ComparisonOperator::EndsWith => None,
        _ => parse_typed_value(&raw_value, column.kind())
            .with_context(|| format!("Filter operand for column '{column}'"))?,
    };
    Ok(FilterCondition {
        column,
        operator,
        operand,
        raw_value,
    })
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if value.len() >= 2
        && ((bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

impl FilterCondition {
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        use ComparisonOperator::*;
        let cell = record.value(self.column);
        match self.operator {
            Contains | StartsWith | EndsWith => {
                let text = cell.map(|v| v.as_display()).unwrap_or_default();
                let haystack = text.to_lowercase();
                let needle = self.raw_value.to_lowercase();
                match self.operator {
                    Contains => haystack.contains(&needle),
                    StartsWith => haystack.starts_with(&needle),
                    _ => haystack.ends_with(&needle),
                }
            }
            Eq | NotEq | Gt | Ge | Lt | Le => match (cell, &self.operand) {
                (Some(left), Some(right)) => {
                    let left = fold_text(left);
                    let right = fold_text(right.clone());
                    match self.operator {
                        Eq => left == right,
                        NotEq => left != right,
                        Gt => left > right,
                        Ge => left >= right,
                        Lt => left < right,
                        _ => left <= right,
                    }
                }
                (None, None) => matches!(self.operator, Eq | Ge | Le),
                _ => self.operator == NotEq,
            },
        }
    }
}

/// Text comparisons ignore case.
fn fold_text(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

/// Rows of `dataset` matching `selection` and every condition, in original
/// order. No match is a valid, empty view.
pub fn apply_filters<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
    conditions: &[FilterCondition],
) -> DatasetView<'a> {
    dataset
        .view()
        .retain(|record| selection.matches(record) && conditions.iter().all(|c| c.matches(record)))
}

/// Filters `dataset` with the command-line selection and `--where` conditions.
///
/// A single hours bound leaves the other side open.
pub fn apply_args<'a>(dataset: &'a Dataset, args: &FilterArgs) -> Result<DatasetView<'a>> {
    let conditions = parse_conditions(&args.conditions)?;
    let hours = match (args.min_hours, args.max_hours) {
        (None, None) => None,
        (low, high) => Some(HoursRange::new(
            low.unwrap_or(f64::NEG_INFINITY),
            high.unwrap_or(f64::INFINITY),
        )?),
    };
    let selection = FilterSelection {
        roles: args.roles.iter().map(|r| r.trim().to_string()).collect(),
        work_modes: args.work_modes.iter().copied().collect(),
        segments: (!args.segments.is_empty())
            .then(|| args.segments.iter().map(|s| s.trim().to_string()).collect()),
        hours,
    };
    let view = apply_filters(dataset, &selection, &conditions);
    debug!("Filters kept {} of {} row(s)", view.len(), dataset.len());
    Ok(view)
}

/// Logs the "no data" state; returns true when there is nothing to report.
pub fn warn_if_empty(view: &DatasetView<'_>) -> bool {
    if view.is_empty() {
        warn!("No rows match the current filters; adjust them to see results");
        true
    } else {
        false
    }
}
