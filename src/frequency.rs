use std::collections::HashMap;

use anyhow::Result;
use log::info;
use serde::Serialize;

use crate::{
    cli::FrequencyArgs, dataset::DatasetView, filter, loader::DatasetLoader, record::ColumnName,
    table,
};

pub const EMPTY_LABEL: &str = "<empty>";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub column: ColumnName,
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

impl FrequencyRow {
    fn render(&self) -> Vec<String> {
        vec![
            self.column.to_string(),
            self.value.clone(),
            self.count.to_string(),
            format!("{:.2}%", self.percent),
        ]
    }
}

/// Value counts of `column` across `view`, most frequent first and ties by
/// value. `top == 0` keeps every value.
pub fn frequency(view: &DatasetView<'_>, column: ColumnName, top: usize) -> Vec<FrequencyRow> {
    let total = view.len();
    if total == 0 {
        return Vec::new();
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in view.iter() {
        let value = match record.cell(column) {
            cell if cell.is_empty() => EMPTY_LABEL.to_string(),
            cell => cell,
        };
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut items = counts.into_iter().collect::<Vec<_>>();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if top > 0 {
        items.truncate(top);
    }
    items
        .into_iter()
        .map(|(value, count)| FrequencyRow {
            column,
            value,
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

pub fn execute(args: &FrequencyArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }
    let rows = args
        .columns
        .iter()
        .flat_map(|column| frequency(&view, *column, args.top))
        .map(|row| row.render())
        .collect::<Vec<_>>();
    let headers = ["column", "value", "count", "percent"].map(String::from);
    table::print_table(&headers, &rows);
    info!(
        "Computed frequency counts for {} column(s) over {} row(s)",
        args.columns.len(),
        view.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::Dataset,
        derive::add_derived_fields,
        record::{BaseRecord, BurnoutLevel, WorkMode},
    };

    fn record(mode: WorkMode, segment: Option<&str>) -> BaseRecord {
        BaseRecord {
            role: "Analyst".into(),
            work_mode: mode,
            stress_score: 5.0,
            burnout_level: BurnoutLevel::Medium,
            hours_per_week: 40.0,
            policy: "Unknown".into(),
            segment: segment.map(str::to_string),
            source: "test".into(),
            age: None,
            gender: None,
        }
    }

    #[test]
    fn counts_are_ordered_by_count_then_value() {
        let data = Dataset::new(add_derived_fields(vec![
            record(WorkMode::Onsite, None),
            record(WorkMode::Remote, None),
            record(WorkMode::Hybrid, None),
            record(WorkMode::Remote, None),
        ]));
        let rows = frequency(&data.view(), ColumnName::WorkMode, 0);
        let values = rows.iter().map(|r| r.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, ["remote", "hybrid", "onsite"]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].percent, 50.0);

        let rows = frequency(&data.view(), ColumnName::WorkMode, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn null_cells_are_reported_as_empty() {
        let data = Dataset::new(add_derived_fields(vec![
            record(WorkMode::Remote, Some("Sales")),
            record(WorkMode::Remote, None),
            record(WorkMode::Remote, None),
        ]));
        let rows = frequency(&data.view(), ColumnName::Segment, 0);
        assert_eq!(rows[0].value, EMPTY_LABEL);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].render(), ["segment", "Sales", "1", "33.33%"]);
    }
}
