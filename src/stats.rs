//! Aggregations over a filtered view: headline indicators, per-group
//! summaries, correlations, and work-mode gaps.
//!
//! Percentages are on a 0–100 scale and gaps are in percentage points.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail, ensure};
use log::info;
use serde::Serialize;

use crate::{
    cli::{CompositionArgs, CorrelateArgs, DeltaArgs, GroupArgs, SummaryArgs},
    data::format_number,
    dataset::DatasetView,
    filter,
    loader::DatasetLoader,
    record::{BurnoutLevel, CanonicalRecord, ColumnName, WorkMode},
    table,
};

pub const CORRELATION_COLUMNS: [ColumnName; 3] = [
    ColumnName::StressScore,
    ColumnName::HoursPerWeek,
    ColumnName::BurnoutNumeric,
];

/// Groups smaller than this are left out of rankings and comparisons.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    stress_sum: f64,
    hours_sum: f64,
    high_burnout: usize,
}

impl Accumulator {
    fn add(&mut self, record: &CanonicalRecord) {
        self.count += 1;
        self.stress_sum += record.base.stress_score;
        self.hours_sum += record.base.hours_per_week;
        if record.base.burnout_level == BurnoutLevel::High {
            self.high_burnout += 1;
        }
    }

    fn mean_stress(&self) -> Option<f64> {
        (self.count > 0).then(|| self.stress_sum / self.count as f64)
    }

    fn mean_hours(&self) -> Option<f64> {
        (self.count > 0).then(|| self.hours_sum / self.count as f64)
    }

    fn high_burnout_pct(&self) -> Option<f64> {
        (self.count > 0).then(|| self.high_burnout as f64 / self.count as f64 * 100.0)
    }
}

/// Headline indicators of a view; means are `None` for an empty view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicators {
    pub respondents: usize,
    pub mean_stress: Option<f64>,
    pub high_burnout_pct: Option<f64>,
    pub mean_hours: Option<f64>,
}

impl Indicators {
    pub fn compute(view: &DatasetView<'_>) -> Self {
        let mut acc = Accumulator::default();
        view.iter().for_each(|record| acc.add(record));
        Self {
            respondents: acc.count,
            mean_stress: acc.mean_stress(),
            high_burnout_pct: acc.high_burnout_pct(),
            mean_hours: acc.mean_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub name: &'static str,
    pub value: Option<f64>,
    pub global: Option<f64>,
    pub delta: f64,
}

/// Difference to the baseline; 0 when either side is missing or the
/// baseline is 0.
pub fn safe_delta(value: Option<f64>, baseline: Option<f64>) -> f64 {
    match (value, baseline) {
        (Some(value), Some(baseline)) if baseline != 0.0 => value - baseline,
        _ => 0.0,
    }
}

/// KPI cards for `view`, each compared with the same indicator on `global`.
pub fn kpis(view: &DatasetView<'_>, global: &DatasetView<'_>) -> Vec<Kpi> {
    let local = Indicators::compute(view);
    let global = Indicators::compute(global);
    [
        (
            "respondents",
            Some(local.respondents as f64),
            Some(global.respondents as f64),
        ),
        ("mean_stress", local.mean_stress, global.mean_stress),
        ("high_burnout_pct", local.high_burnout_pct, global.high_burnout_pct),
        ("mean_hours", local.mean_hours, global.mean_hours),
    ]
    .into_iter()
    .map(|(name, value, global)| Kpi {
        name,
        value,
        global,
        delta: safe_delta(value, global),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub respondents: usize,
    pub mean_stress: f64,
    pub mean_hours: f64,
    pub high_burnout_pct: f64,
}

fn ensure_groupable(column: ColumnName) -> Result<()> {
    ensure!(
        column.is_categorical(),
        "Column '{column}' is numeric; group by a categorical column such as role, work_mode, segment, or policy"
    );
    Ok(())
}

/// One row per distinct value of `column` with at least `min_count`
/// respondents, highest high-burnout share first. Rows where `column` is
/// null are left out.
pub fn group_summary(
    view: &DatasetView<'_>,
    column: ColumnName,
    min_count: usize,
) -> Result<Vec<GroupSummary>> {
    ensure_groupable(column)?;
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for record in view.iter() {
        if let Some(key) = record.value(column) {
            groups.entry(key.as_display()).or_default().add(record);
        }
    }
    let mut rows = groups
        .into_iter()
        .filter(|(_, acc)| acc.count >= min_count.max(1))
        .map(|(group, acc)| GroupSummary {
            group,
            respondents: acc.count,
            mean_stress: acc.mean_stress().unwrap_or_default(),
            mean_hours: acc.mean_hours().unwrap_or_default(),
            high_burnout_pct: acc.high_burnout_pct().unwrap_or_default(),
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| {
        b.high_burnout_pct
            .total_cmp(&a.high_burnout_pct)
            .then_with(|| a.group.cmp(&b.group))
    });
    Ok(rows)
}

/// Share of each burnout level inside one group; the three shares sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurnoutComposition {
    pub group: String,
    pub respondents: usize,
    pub low_pct: f64,
    pub medium_pct: f64,
    pub high_pct: f64,
}

impl BurnoutComposition {
    pub fn share(&self, level: BurnoutLevel) -> f64 {
        match level {
            BurnoutLevel::Low => self.low_pct,
            BurnoutLevel::Medium => self.medium_pct,
            BurnoutLevel::High => self.high_pct,
        }
    }
}

/// Burnout level mix per distinct value of `by`, in group order. Groups
/// with fewer than `min_count` respondents and rows where `by` is null are
/// left out.
pub fn burnout_composition(
    view: &DatasetView<'_>,
    by: ColumnName,
    min_count: usize,
) -> Result<Vec<BurnoutComposition>> {
    ensure_groupable(by)?;
    let mut groups: BTreeMap<String, [usize; 3]> = BTreeMap::new();
    for record in view.iter() {
        if let Some(key) = record.value(by) {
            let slot = usize::from(record.base.burnout_level.numeric() - 1);
            groups.entry(key.as_display()).or_default()[slot] += 1;
        }
    }
    Ok(groups
        .into_iter()
        .filter_map(|(group, [low, medium, high])| {
            let respondents = low + medium + high;
            if respondents < min_count.max(1) {
                return None;
            }
            let pct = |count: usize| count as f64 / respondents as f64 * 100.0;
            Some(BurnoutComposition {
                group,
                respondents,
                low_pct: pct(low),
                medium_pct: pct(medium),
                high_pct: pct(high),
            })
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, left: ColumnName, right: ColumnName) -> Option<f64> {
        let row = self.columns.iter().position(|c| *c == left.as_str())?;
        let col = self.columns.iter().position(|c| *c == right.as_str())?;
        self.values[row][col]
    }
}

/// Pearson coefficient over paired samples; `None` with fewer than two
/// pairs or when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

pub fn correlation_matrix(view: &DatasetView<'_>) -> CorrelationMatrix {
    let series = CORRELATION_COLUMNS.map(|column| view.column(column));
    let values = series
        .iter()
        .map(|left| {
            series
                .iter()
                .map(|right| {
                    let (xs, ys): (Vec<f64>, Vec<f64>) = left
                        .iter()
                        .zip(right)
                        .filter_map(|(l, r)| Some((l.as_ref()?.as_f64()?, r.as_ref()?.as_f64()?)))
                        .unzip();
                    pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();
    CorrelationMatrix {
        columns: CORRELATION_COLUMNS.iter().map(|c| c.as_str()).collect(),
        values,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeDelta {
    pub group: String,
    pub first_respondents: usize,
    pub second_respondents: usize,
    pub first_high_pct: f64,
    pub second_high_pct: f64,
    pub delta_pp: f64,
}

/// High-burnout share of `first` minus that of `second` inside each group
/// of `by`. Groups where either mode has fewer than `min_count` rows are
/// skipped. Largest gap first.
pub fn work_mode_delta(
    view: &DatasetView<'_>,
    by: ColumnName,
    first: WorkMode,
    second: WorkMode,
    min_count: usize,
) -> Result<Vec<ModeDelta>> {
    ensure_groupable(by)?;
    ensure!(by != ColumnName::WorkMode, "Cannot compare work modes within work_mode groups");
    ensure!(first != second, "Pick two different work modes to compare (got '{first}' twice)");

    let mut groups: BTreeMap<String, (Accumulator, Accumulator)> = BTreeMap::new();
    for record in view.iter() {
        let Some(key) = record.value(by) else {
            continue;
        };
        let mode = record.base.work_mode;
        if mode != first && mode != second {
            continue;
        }
        let entry = groups.entry(key.as_display()).or_default();
        if mode == first {
            entry.0.add(record);
        } else {
            entry.1.add(record);
        }
    }

    let threshold = min_count.max(1);
    let mut rows = groups
        .into_iter()
        .filter_map(|(group, (a, b))| {
            if a.count < threshold || b.count < threshold {
                return None;
            }
            let first_high_pct = a.high_burnout_pct()?;
            let second_high_pct = b.high_burnout_pct()?;
            Some(ModeDelta {
                group,
                first_respondents: a.count,
                second_respondents: b.count,
                first_high_pct,
                second_high_pct,
                delta_pp: first_high_pct - second_high_pct,
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.delta_pp.total_cmp(&a.delta_pp).then_with(|| a.group.cmp(&b.group)));
    Ok(rows)
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| fixed(v, 2)).unwrap_or_else(|| "-".to_string())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Serializing JSON output")?;
    println!("{rendered}");
    Ok(())
}

pub fn execute_summary(args: &SummaryArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let cards = kpis(&view, &outcome.dataset.view());
    if args.json {
        return print_json(&cards);
    }
    let rows = cards
        .iter()
        .map(|kpi| {
            let value = match kpi.name {
                "respondents" => kpi.value.map(format_number).unwrap_or_default(),
                _ => optional(kpi.value),
            };
            vec![
                kpi.name.to_string(),
                value,
                optional(kpi.global),
                format!("{:+.2}", kpi.delta),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers(&["indicator", "value", "global", "delta"]), &rows);
    info!("Summarized {} of {} row(s)", view.len(), outcome.dataset.len());
    Ok(())
}

pub fn execute_group(args: &GroupArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let groups = group_summary(&view, args.by, args.min_count)?;
    if args.json {
        return print_json(&groups);
    }
    let rows = groups
        .iter()
        .map(|g| {
            vec![
                g.group.clone(),
                g.respondents.to_string(),
                fixed(g.mean_stress, 2),
                fixed(g.mean_hours, 1),
                format!("{}%", fixed(g.high_burnout_pct, 1)),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(
        &headers(&[args.by.as_str(), "n", "mean_stress", "mean_hours", "high_burnout"]),
        &rows,
    );
    info!("Grouped {} row(s) into {} '{}' group(s)", view.len(), groups.len(), args.by);
    Ok(())
}

pub fn execute_composition(args: &CompositionArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let groups = burnout_composition(&view, args.by, args.min_count)?;
    if args.json {
        return print_json(&groups);
    }
    let rows = groups
        .iter()
        .map(|g| {
            let mut row = vec![g.group.clone(), g.respondents.to_string()];
            row.extend(
                BurnoutLevel::ALL
                    .iter()
                    .map(|level| format!("{}%", fixed(g.share(*level), 1))),
            );
            row
        })
        .collect::<Vec<_>>();
    table::print_table(
        &headers(&[args.by.as_str(), "n", "low", "medium", "high"]),
        &rows,
    );
    info!(
        "Split {} row(s) into {} '{}' group(s) by burnout level",
        view.len(),
        groups.len(),
        args.by
    );
    Ok(())
}

pub fn execute_correlate(args: &CorrelateArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let matrix = correlation_matrix(&view);
    if args.json {
        return print_json(&matrix);
    }
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().map(|c| c.to_string()));
    let rows = matrix
        .columns
        .iter()
        .zip(&matrix.values)
        .map(|(name, values)| {
            let mut row = vec![name.to_string()];
            row.extend(values.iter().map(|v| v.map(|v| fixed(v, 3)).unwrap_or_else(|| "-".into())));
            row
        })
        .collect::<Vec<_>>();
    table::print_table(&header, &rows);
    Ok(())
}

pub fn execute_delta(args: &DeltaArgs) -> Result<()> {
    let [first, second] = args.modes.as_slice() else {
        bail!(
            "--modes takes exactly two work modes (got {})",
            args.modes.len()
        );
    };
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let deltas = work_mode_delta(&view, args.by, *first, *second, args.min_count)?;
    if deltas.is_empty() {
        info!(
            "No '{}' group has at least {} {first} and {} {second} respondent(s)",
            args.by, args.min_count, args.min_count
        );
    }
    let rows = deltas
        .iter()
        .map(|d| {
            vec![
                d.group.clone(),
                d.first_respondents.to_string(),
                d.second_respondents.to_string(),
                format!("{}%", fixed(d.first_high_pct, 1)),
                format!("{}%", fixed(d.second_high_pct, 1)),
                format!("{:+.1}pp", d.delta_pp),
            ]
        })
        .collect::<Vec<_>>();
    let first_n = format!("n_{first}");
    let second_n = format!("n_{second}");
    let first_high = format!("high_{first}");
    let second_high = format!("high_{second}");
    table::print_table(
        &headers(&[
            args.by.as_str(),
            first_n.as_str(),
            second_n.as_str(),
            first_high.as_str(),
            second_high.as_str(),
            "delta",
        ]),
        &rows,
    );
    Ok(())
}
