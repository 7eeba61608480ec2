//! Maps one raw source table onto [`BaseRecord`]s using its [`SourceProfile`].

use log::debug;

use crate::{
    canonical::{
        self, CanonicalField, CanonicalizationReport, DEFAULT_STRESS, StressScale,
    },
    data::parse_number,
    profile::{BurnoutRule, NumericRule, ProfileSet, SourceProfile, StressRule, TextRule},
    raw::RawTable,
    record::{BaseRecord, BurnoutLevel, WorkMode},
};

const MAX_PLAUSIBLE_AGE: f64 = 120.0;

#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub source: String,
    pub profile: String,
    pub records: Vec<BaseRecord>,
    pub report: CanonicalizationReport,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn empty(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            report: CanonicalizationReport::new(source.clone()),
            source,
            profile: String::new(),
            records: Vec::new(),
        }
    }
}

/// Normalizes `table` with the profile matching `source_identifier`; an
/// unrecognized identifier falls back to the generic pass-through profile.
pub fn normalize(table: &RawTable, source_identifier: &str, profiles: &ProfileSet) -> NormalizedTable {
    normalize_with_profile(table, profiles.resolve(source_identifier))
}

pub fn normalize_with_profile(table: &RawTable, profile: &SourceProfile) -> NormalizedTable {
    let source = table.source_tag();
    let plan = ColumnPlan::resolve(table, profile);
    let mut report = CanonicalizationReport::new(source.clone());
    let records = (0..table.len())
        .map(|row| plan.record(table, row, &source, &mut report))
        .collect::<Vec<_>>();
    debug!(
        "Normalized {} row(s) from '{}' using profile '{}'",
        records.len(),
        source,
        profile.name
    );
    NormalizedTable {
        source,
        profile: profile.name.clone(),
        records,
        report,
    }
}

/// Reads a text field; `None` when the column is absent.
struct TextColumn<'a> {
    rule: &'a TextRule,
    index: Option<usize>,
}

impl<'a> TextColumn<'a> {
    fn resolve(table: &RawTable, rule: &'a TextRule, field: &str) -> Self {
        let index = rule.column.as_deref().and_then(|name| {
            let found = table.column_index(name);
            if found.is_none() && rule.constant.is_none() {
                debug!(
                    "{:?}: column '{name}' for '{field}' not present, using '{}'",
                    table.path, rule.default
                );
            }
            found
        });
        Self { rule, index }
    }

    /// Raw answer before defaults: the constant, or the mapped cell.
    fn raw(&self, table: &RawTable, row: usize) -> Option<String> {
        if let Some(constant) = &self.rule.constant {
            return Some(constant.clone());
        }
        let cell = table.cell(row, self.index?)?;
        self.rule.map_value(cell)
    }

    fn present(&self) -> bool {
        self.rule.constant.is_some() || self.index.is_some()
    }

    fn value(&self, table: &RawTable, row: usize) -> String {
        self.raw(table, row)
            .unwrap_or_else(|| self.rule.default.clone())
    }
}

struct ColumnPlan<'a> {
    profile: &'a SourceProfile,
    role: TextColumn<'a>,
    work_mode: TextColumn<'a>,
    policy: TextColumn<'a>,
    segment: Option<TextColumn<'a>>,
    hours: Option<usize>,
    stress: Option<usize>,
    burnout: Option<usize>,
    age: Option<usize>,
    gender: Option<usize>,
}

impl<'a> ColumnPlan<'a> {
    fn resolve(table: &RawTable, profile: &'a SourceProfile) -> Self {
        let lookup = |name: Option<&str>| name.and_then(|n| table.column_index(n));
        let stress_column = match &profile.stress {
            StressRule::Labels { column, .. } | StressRule::Numeric { column, .. } => column,
        };
        let burnout_column = match &profile.burnout {
            BurnoutRule::Labels { column, .. } | BurnoutRule::Score { column, .. } => column,
        };
        let segment = profile
            .segment
            .as_ref()
            .map(|rule| TextColumn::resolve(table, rule, "segment"))
            .filter(TextColumn::present);
        Self {
            profile,
            role: TextColumn::resolve(table, &profile.role, "role"),
            work_mode: TextColumn::resolve(table, &profile.work_mode, "work_mode"),
            policy: TextColumn::resolve(table, &profile.policy, "policy"),
            segment,
            hours: lookup(profile.hours_per_week.column.as_deref()),
            stress: lookup(Some(stress_column.as_str())),
            burnout: lookup(Some(burnout_column.as_str())),
            age: lookup(profile.age.as_deref()),
            gender: lookup(profile.gender.as_deref()),
        }
    }

    fn record(
        &self,
        table: &RawTable,
        row: usize,
        source: &str,
        report: &mut CanonicalizationReport,
    ) -> BaseRecord {
        BaseRecord {
            role: self.role.value(table, row),
            work_mode: self.work_mode(table, row, report),
            stress_score: self.stress(table, row, report),
            burnout_level: self.burnout(table, row, report),
            hours_per_week: self.hours(table, row, report),
            policy: self.policy.value(table, row),
            segment: self.segment.as_ref().map(|column| column.value(table, row)),
            source: source.to_string(),
            age: self
                .age
                .and_then(|idx| table.cell(row, idx))
                .and_then(parse_age),
            gender: self
                .gender
                .and_then(|idx| table.cell(row, idx))
                .map(|raw| raw.trim().to_lowercase())
                .filter(|value| !value.is_empty()),
        }
    }

    fn work_mode(
        &self,
        table: &RawTable,
        row: usize,
        report: &mut CanonicalizationReport,
    ) -> WorkMode {
        let raw = self
            .work_mode
            .raw(table, row)
            .unwrap_or_else(|| self.work_mode.rule.default.clone());
        canonical::lookup_work_mode(&raw).unwrap_or_else(|| {
            report.record(CanonicalField::WorkMode, &raw);
            canonical::DEFAULT_WORK_MODE
        })
    }

    fn stress(&self, table: &RawTable, row: usize, report: &mut CanonicalizationReport) -> f64 {
        let Some(index) = self.stress else {
            return DEFAULT_STRESS;
        };
        let cell = table.cell(row, index).unwrap_or("");
        let scale = match &self.profile.stress {
            StressRule::Labels { labels, .. } => StressScale::Labels(labels),
            StressRule::Numeric { max, .. } => StressScale::Numeric { max: *max },
        };
        canonical::lookup_stress(cell, scale).unwrap_or_else(|| {
            report.record(CanonicalField::StressScore, cell);
            DEFAULT_STRESS
        })
    }

    fn burnout(
        &self,
        table: &RawTable,
        row: usize,
        report: &mut CanonicalizationReport,
    ) -> BurnoutLevel {
        let (mapped, default) = match &self.profile.burnout {
            BurnoutRule::Labels {
                labels, default, ..
            } => {
                let cell = self.burnout.and_then(|idx| table.cell(row, idx));
                (
                    cell.and_then(|raw| canonical::lookup_burnout_label(raw, labels)),
                    *default,
                )
            }
            BurnoutRule::Score { cuts, default, .. } => {
                let cell = self.burnout.and_then(|idx| table.cell(row, idx));
                (
                    cell.and_then(parse_number)
                        .map(|score| canonical::bucket_burnout_score(score, *cuts)),
                    *default,
                )
            }
        };
        mapped.unwrap_or_else(|| {
            if let Some(idx) = self.burnout {
                report.record(CanonicalField::BurnoutLevel, table.cell(row, idx).unwrap_or(""));
            }
            default
        })
    }

    fn hours(&self, table: &RawTable, row: usize, report: &mut CanonicalizationReport) -> f64 {
        let NumericRule { default, .. } = &self.profile.hours_per_week;
        let Some(index) = self.hours else {
            return *default;
        };
        let cell = table.cell(row, index).unwrap_or("");
        match parse_number(cell) {
            Some(hours) => hours.max(0.0),
            None => {
                report.record(CanonicalField::HoursPerWeek, cell);
                *default
            }
        }
    }
}

fn parse_age(raw: &str) -> Option<u32> {
    parse_number(raw)
        .filter(|age| (0.0..=MAX_PLAUSIBLE_AGE).contains(age))
        .map(|age| age.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(path: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            path,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn principal_source_fills_work_mode_and_hours() {
        let raw = table(
            "data/dataset_principal.csv",
            &["Gender", "Occupation", "Growing_Stress", "Mood_Swings", "care_options"],
            &[
                &["Female", "Corporate", "Yes", "High", "Not sure"],
                &["Male", "Student", "Maybe", "Sometimes", ""],
            ],
        );
        let normalized = normalize(&raw, "dataset_principal", &ProfileSet::builtin());
        assert_eq!(normalized.profile, "dataset_principal");
        let first = &normalized.records[0];
        assert_eq!(first.role, "Corporate");
        assert_eq!(first.work_mode, WorkMode::Onsite);
        assert_eq!(first.stress_score, 8.0);
        assert_eq!(first.burnout_level, BurnoutLevel::High);
        assert_eq!(first.hours_per_week, 40.0);
        assert_eq!(first.policy, "Not sure");
        assert_eq!(first.segment, None);
        assert_eq!(first.gender.as_deref(), Some("female"));

        let second = &normalized.records[1];
        assert_eq!(second.stress_score, DEFAULT_STRESS);
        assert_eq!(second.burnout_level, BurnoutLevel::Medium);
        assert_eq!(second.policy, "Unknown");
        assert_eq!(normalized.report.count_for(CanonicalField::StressScore), 1);
        assert_eq!(normalized.report.count_for(CanonicalField::BurnoutLevel), 1);
    }

    #[test]
    fn workplace_source_buckets_scores_and_maps_support() {
        let raw = table(
            "dataset_workplace.csv",
            &[
                "JobRole",
                "RemoteWork",
                "WorkHoursPerWeek",
                "StressLevel",
                "BurnoutLevel",
                "HasMentalHealthSupport",
                "Department",
                "Age",
            ],
            &[
                &["Engineer", "Yes", "50", "12", "7.5", "Yes", "IT", "29"],
                &["Analyst", "No", "-3", "4", "", "Perhaps", "Finance", "abc"],
            ],
        );
        let normalized = normalize(&raw, "dataset_workplace", &ProfileSet::builtin());
        let first = &normalized.records[0];
        assert_eq!(first.work_mode, WorkMode::Remote);
        assert_eq!(first.stress_score, 10.0);
        assert_eq!(first.burnout_level, BurnoutLevel::High);
        assert_eq!(first.policy, "With Support");
        assert_eq!(first.segment.as_deref(), Some("IT"));
        assert_eq!(first.age, Some(29));

        let second = &normalized.records[1];
        assert_eq!(second.work_mode, WorkMode::Onsite);
        assert_eq!(second.hours_per_week, 0.0);
        assert_eq!(second.burnout_level, BurnoutLevel::Medium);
        assert_eq!(second.policy, "Unknown");
        assert_eq!(second.age, None);
        assert_eq!(second.gender, None);
    }

    #[test]
    fn missing_columns_use_field_fallbacks() {
        let raw = table("dataset_burnout.csv", &["Stress_Level"], &[&["Low"]]);
        let normalized = normalize(&raw, "dataset_burnout", &ProfileSet::builtin());
        let record = &normalized.records[0];
        assert_eq!(record.role, "Unknown");
        assert_eq!(record.work_mode, WorkMode::Onsite);
        assert_eq!(record.hours_per_week, 40.0);
        assert_eq!(record.policy, "Unknown");
        assert_eq!(record.segment, None);
        assert_eq!(record.stress_score, 2.0);
        assert_eq!(record.burnout_level, BurnoutLevel::Low);
    }

    #[test]
    fn unrecognized_source_passes_through_canonical_columns() {
        let raw = table(
            "exports/pulse.csv",
            &["role", "work_mode", "stress_score", "burnout_level", "hours_per_week"],
            &[&["Nurse", "Hybrid", "6.5", "HIGH", "38"]],
        );
        let normalized = normalize(&raw, "pulse", &ProfileSet::builtin());
        assert_eq!(normalized.profile, "generic");
        assert_eq!(normalized.source, "pulse");
        let record = &normalized.records[0];
        assert_eq!(record.role, "Nurse");
        assert_eq!(record.work_mode, WorkMode::Hybrid);
        assert_eq!(record.stress_score, 6.5);
        assert_eq!(record.burnout_level, BurnoutLevel::High);
        assert_eq!(record.hours_per_week, 38.0);
    }

    #[test]
    fn novel_work_mode_is_reported() {
        let raw = table(
            "dataset_burnout.csv",
            &["Work_Location", "Stress_Level"],
            &[&["Moon base", "High"], &["Remote", "High"]],
        );
        let normalized = normalize(&raw, "dataset_burnout", &ProfileSet::builtin());
        assert_eq!(normalized.records[0].work_mode, WorkMode::Onsite);
        assert_eq!(normalized.records[1].work_mode, WorkMode::Remote);
        assert_eq!(
            normalized.report.entries(),
            vec![(CanonicalField::WorkMode, "Moon base".to_string(), 1)]
        );
    }
}
