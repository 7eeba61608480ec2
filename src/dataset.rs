//! The unified table and read-only views over it.
//!
//! A [`Dataset`] is built once by [`merge`] and never mutated afterwards.
//! Every query (filtering, masking, grouping) works on a [`DatasetView`],
//! which borrows rows instead of copying them.

use anyhow::{Result, ensure};
use log::info;

use crate::{
    data::Value,
    derive::add_derived_fields,
    normalize::NormalizedTable,
    record::{CanonicalRecord, ColumnName},
};

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CanonicalRecord>,
    sources: Vec<String>,
}

impl Dataset {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        let mut sources: Vec<String> = Vec::new();
        for record in &records {
            if !sources.contains(&record.base.source) {
                sources.push(record.base.source.clone());
            }
        }
        Self { records, sources }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Provenance tags in load order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            records: self.records.iter().collect(),
        }
    }

    pub fn column(&self, column: ColumnName) -> Vec<Option<Value>> {
        self.view().column(column)
    }

    pub fn mask(&self, mask: &[bool]) -> Result<DatasetView<'_>> {
        self.view().mask(mask)
    }

    pub fn has_segment(&self) -> bool {
        self.view().has_column(ColumnName::Segment)
    }

    /// Required columns plus the optional ones at least one row fills.
    pub fn columns(&self) -> Vec<ColumnName> {
        let view = self.view();
        ColumnName::ALL
            .into_iter()
            .filter(|column| ColumnName::REQUIRED.contains(column) || view.has_column(*column))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasetView<'a> {
    records: Vec<&'a CanonicalRecord>,
}

impl<'a> DatasetView<'a> {
    pub fn from_records(records: Vec<&'a CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CanonicalRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn column(&self, column: ColumnName) -> Vec<Option<Value>> {
        self.iter().map(|record| record.value(column)).collect()
    }

    pub fn has_column(&self, column: ColumnName) -> bool {
        self.iter().any(|record| record.value(column).is_some())
    }

    /// Rows where `mask` is true, in their original order.
    pub fn mask(&self, mask: &[bool]) -> Result<DatasetView<'a>> {
        ensure!(
            mask.len() == self.records.len(),
            "Row mask has {} entries but the table has {} row(s)",
            mask.len(),
            self.records.len()
        );
        Ok(DatasetView {
            records: self
                .records
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(record, _)| *record)
                .collect(),
        })
    }

    pub fn retain<F>(&self, mut predicate: F) -> DatasetView<'a>
    where
        F: FnMut(&CanonicalRecord) -> bool,
    {
        DatasetView {
            records: self
                .records
                .iter()
                .copied()
                .filter(|record| predicate(record))
                .collect(),
        }
    }

    pub fn head(&self, rows: usize) -> DatasetView<'a> {
        DatasetView {
            records: self.records.iter().take(rows).copied().collect(),
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.iter().map(CanonicalRecord::to_row).collect()
    }
}

/// Concatenates per-source tables row-wise, deriving secondary fields.
///
/// Optional columns a source lacks stay `None` on its rows; no row is
/// dropped. Zero tables yield an empty dataset.
pub fn merge(tables: Vec<NormalizedTable>) -> Dataset {
    let total = tables.iter().map(NormalizedTable::len).sum::<usize>();
    let mut records = Vec::with_capacity(total);
    for table in tables {
        info!("Merged {} row(s) from '{}'", table.len(), table.source);
        records.extend(add_derived_fields(table.records));
    }
    Dataset::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canonical::CanonicalizationReport,
        record::{BaseRecord, BurnoutLevel, WorkMode},
    };

    fn base(source: &str, segment: Option<&str>) -> BaseRecord {
        BaseRecord {
            role: "Analyst".into(),
            work_mode: WorkMode::Remote,
            stress_score: 4.0,
            burnout_level: BurnoutLevel::Low,
            hours_per_week: 40.0,
            policy: "Unknown".into(),
            segment: segment.map(str::to_string),
            source: source.into(),
            age: None,
            gender: None,
        }
    }

    fn table(source: &str, records: Vec<BaseRecord>) -> NormalizedTable {
        NormalizedTable {
            source: source.into(),
            profile: source.into(),
            records,
            report: CanonicalizationReport::new(source),
        }
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        let dataset = merge(Vec::new());
        assert!(dataset.is_empty());
        assert_eq!(dataset.len(), 0);
        assert!(!dataset.has_segment());
    }

    #[test]
    fn merge_keeps_rows_from_sources_without_segment() {
        let dataset = merge(vec![
            table("a", vec![base("a", None), base("a", None)]),
            table("b", vec![base("b", Some("Europe"))]),
        ]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.sources(), ["a".to_string(), "b".to_string()]);
        assert!(dataset.has_segment());
        assert_eq!(
            dataset.column(ColumnName::Segment),
            vec![None, None, Some(Value::String("Europe".into()))]
        );
        assert!(dataset.columns().contains(&ColumnName::Segment));
        assert!(!dataset.columns().contains(&ColumnName::AgeGroup));
    }

    #[test]
    fn mask_preserves_order_and_rejects_wrong_length() {
        let mut first = base("a", None);
        first.role = "First".into();
        let mut third = base("a", None);
        third.role = "Third".into();
        let dataset = merge(vec![table("a", vec![first, base("a", None), third])]);
        let view = dataset.mask(&[true, false, true]).expect("mask");
        let roles = view
            .iter()
            .map(|r| r.base.role.as_str())
            .collect::<Vec<_>>();
        assert_eq!(roles, ["First", "Third"]);
        assert!(dataset.mask(&[true]).is_err());
    }
}
