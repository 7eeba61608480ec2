//! Secondary columns computed from canonical base fields.

use crate::record::{AgeGroup, BaseRecord, CanonicalRecord, DerivedFields, HoursBand};

pub const STANDARD_HOURS_MIN: f64 = 35.0;
pub const STANDARD_HOURS_MAX: f64 = 45.0;
pub const MIN_SURVEY_AGE: u32 = 18;

/// `<35h` below 35, `35–45h` for 35 through 45 inclusive, `>45h` above.
pub fn hours_band(hours_per_week: f64) -> HoursBand {
    if hours_per_week < STANDARD_HOURS_MIN {
        HoursBand::Under35
    } else if hours_per_week <= STANDARD_HOURS_MAX {
        HoursBand::Standard
    } else {
        HoursBand::Over45
    }
}

/// `None` for respondents under 18.
pub fn age_group(age: u32) -> Option<AgeGroup> {
    match age {
        a if a < MIN_SURVEY_AGE => None,
        18..=30 => Some(AgeGroup::From18To30),
        31..=40 => Some(AgeGroup::From31To40),
        41..=50 => Some(AgeGroup::From41To50),
        _ => Some(AgeGroup::Over50),
    }
}

pub fn derive_fields(base: &BaseRecord) -> DerivedFields {
    DerivedFields {
        hours_band: hours_band(base.hours_per_week),
        burnout_numeric: base.burnout_level.numeric(),
        age_group: base.age.and_then(age_group),
    }
}

pub fn add_derived_fields(records: Vec<BaseRecord>) -> Vec<CanonicalRecord> {
    records
        .into_iter()
        .map(|base| {
            let derived = derive_fields(&base);
            CanonicalRecord { base, derived }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BurnoutLevel, WorkMode};

    #[test]
    fn hours_band_boundaries() {
        assert_eq!(hours_band(34.9), HoursBand::Under35);
        assert_eq!(hours_band(35.0), HoursBand::Standard);
        assert_eq!(hours_band(36.0).as_str(), "35–45h");
        assert_eq!(hours_band(45.0), HoursBand::Standard);
        assert_eq!(hours_band(50.0).as_str(), ">45h");
        assert_eq!(hours_band(0.0), HoursBand::Under35);
    }

    #[test]
    fn age_group_boundaries() {
        assert_eq!(age_group(17), None);
        assert_eq!(age_group(18), Some(AgeGroup::From18To30));
        assert_eq!(age_group(30), Some(AgeGroup::From18To30));
        assert_eq!(age_group(31), Some(AgeGroup::From31To40));
        assert_eq!(age_group(50), Some(AgeGroup::From41To50));
        assert_eq!(age_group(51).map(AgeGroup::as_str), Some("50+"));
    }

    #[test]
    fn derived_fields_never_touch_base_fields() {
        let base = BaseRecord {
            role: "Nurse".into(),
            work_mode: WorkMode::Hybrid,
            stress_score: 6.0,
            burnout_level: BurnoutLevel::High,
            hours_per_week: 48.0,
            policy: "Unknown".into(),
            segment: None,
            source: "dataset_burnout".into(),
            age: Some(44),
            gender: None,
        };
        let records = add_derived_fields(vec![base.clone()]);
        assert_eq!(records[0].base, base);
        assert_eq!(records[0].derived.hours_band, HoursBand::Over45);
        assert_eq!(records[0].derived.burnout_numeric, 3);
        assert_eq!(records[0].derived.age_group, Some(AgeGroup::From41To50));
    }
}
