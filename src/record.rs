//! The canonical row shape every source is normalized into.

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Value, ValueKind, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Remote,
    Hybrid,
    Onsite,
}

impl WorkMode {
    pub const ALL: [WorkMode; 3] = [WorkMode::Remote, WorkMode::Hybrid, WorkMode::Onsite];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkMode::Remote => "remote",
            WorkMode::Hybrid => "hybrid",
            WorkMode::Onsite => "onsite",
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        WorkMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown work mode '{s}' (expected remote, hybrid, or onsite)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnoutLevel {
    Low,
    Medium,
    High,
}

impl BurnoutLevel {
    pub const ALL: [BurnoutLevel; 3] = [BurnoutLevel::Low, BurnoutLevel::Medium, BurnoutLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            BurnoutLevel::Low => "low",
            BurnoutLevel::Medium => "medium",
            BurnoutLevel::High => "high",
        }
    }

    /// Ordinal encoding used for correlation: low=1, medium=2, high=3.
    pub fn numeric(self) -> u8 {
        match self {
            BurnoutLevel::Low => 1,
            BurnoutLevel::Medium => 2,
            BurnoutLevel::High => 3,
        }
    }
}

impl fmt::Display for BurnoutLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BurnoutLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        BurnoutLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Unknown burnout level '{s}' (expected low, medium, or high)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HoursBand {
    #[serde(rename = "<35h")]
    Under35,
    #[serde(rename = "35–45h")]
    Standard,
    #[serde(rename = ">45h")]
    Over45,
}

impl HoursBand {
    pub fn as_str(self) -> &'static str {
        match self {
            HoursBand::Under35 => "<35h",
            HoursBand::Standard => "35–45h",
            HoursBand::Over45 => ">45h",
        }
    }
}

impl fmt::Display for HoursBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "18-30")]
    From18To30,
    #[serde(rename = "31-40")]
    From31To40,
    #[serde(rename = "41-50")]
    From41To50,
    #[serde(rename = "50+")]
    Over50,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::From18To30 => "18-30",
            AgeGroup::From31To40 => "31-40",
            AgeGroup::From41To50 => "41-50",
            AgeGroup::Over50 => "50+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields produced by source normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseRecord {
    pub role: String,
    pub work_mode: WorkMode,
    pub stress_score: f64,
    pub burnout_level: BurnoutLevel,
    pub hours_per_week: f64,
    pub policy: String,
    pub segment: Option<String>,
    pub source: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Fields computed from a [`BaseRecord`]; see [`crate::derive`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFields {
    pub hours_band: HoursBand,
    pub burnout_numeric: u8,
    pub age_group: Option<AgeGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    #[serde(flatten)]
    pub base: BaseRecord,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

impl CanonicalRecord {
    pub fn value(&self, column: ColumnName) -> Option<Value> {
        let base = &self.base;
        let derived = &self.derived;
        match column {
            ColumnName::Role => Some(Value::String(base.role.clone())),
            ColumnName::WorkMode => Some(Value::String(base.work_mode.to_string())),
            ColumnName::StressScore => Some(Value::Float(base.stress_score)),
            ColumnName::BurnoutLevel => Some(Value::String(base.burnout_level.to_string())),
            ColumnName::HoursPerWeek => Some(Value::Float(base.hours_per_week)),
            ColumnName::Policy => Some(Value::String(base.policy.clone())),
            ColumnName::Segment => base.segment.clone().map(Value::String),
            ColumnName::Source => Some(Value::String(base.source.clone())),
            ColumnName::Age => base.age.map(|age| Value::Integer(i64::from(age))),
            ColumnName::Gender => base.gender.clone().map(Value::String),
            ColumnName::HoursBand => Some(Value::String(derived.hours_band.to_string())),
            ColumnName::BurnoutNumeric => {
                Some(Value::Integer(i64::from(derived.burnout_numeric)))
            }
            ColumnName::AgeGroup => derived.age_group.map(|g| Value::String(g.to_string())),
        }
    }

    /// Display form of one cell; nulls render empty.
    pub fn cell(&self, column: ColumnName) -> String {
        match self.value(column) {
            Some(Value::Float(f)) => format_number(f),
            Some(other) => other.as_display(),
            None => String::new(),
        }
    }

    /// Cells in [`ColumnName::ALL`] order.
    pub fn to_row(&self) -> Vec<String> {
        ColumnName::ALL.iter().map(|column| self.cell(*column)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnName {
    Role,
    WorkMode,
    StressScore,
    BurnoutLevel,
    HoursPerWeek,
    Policy,
    Segment,
    Source,
    Age,
    Gender,
    HoursBand,
    BurnoutNumeric,
    AgeGroup,
}

impl ColumnName {
    pub const ALL: [ColumnName; 13] = [
        ColumnName::Role,
        ColumnName::WorkMode,
        ColumnName::StressScore,
        ColumnName::BurnoutLevel,
        ColumnName::HoursPerWeek,
        ColumnName::Policy,
        ColumnName::Segment,
        ColumnName::Source,
        ColumnName::Age,
        ColumnName::Gender,
        ColumnName::HoursBand,
        ColumnName::BurnoutNumeric,
        ColumnName::AgeGroup,
    ];

    /// Columns that are non-null on every row.
    pub const REQUIRED: [ColumnName; 9] = [
        ColumnName::Role,
        ColumnName::WorkMode,
        ColumnName::StressScore,
        ColumnName::BurnoutLevel,
        ColumnName::HoursPerWeek,
        ColumnName::Policy,
        ColumnName::Source,
        ColumnName::HoursBand,
        ColumnName::BurnoutNumeric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnName::Role => "role",
            ColumnName::WorkMode => "work_mode",
            ColumnName::StressScore => "stress_score",
            ColumnName::BurnoutLevel => "burnout_level",
            ColumnName::HoursPerWeek => "hours_per_week",
            ColumnName::Policy => "policy",
            ColumnName::Segment => "segment",
            ColumnName::Source => "source",
            ColumnName::Age => "age",
            ColumnName::Gender => "gender",
            ColumnName::HoursBand => "hours_band",
            ColumnName::BurnoutNumeric => "burnout_numeric",
            ColumnName::AgeGroup => "age_group",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            ColumnName::StressScore | ColumnName::HoursPerWeek => ValueKind::Float,
            ColumnName::Age | ColumnName::BurnoutNumeric => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }

    pub fn is_categorical(self) -> bool {
        self.kind() == ValueKind::Text
    }

    pub fn headers() -> Vec<String> {
        ColumnName::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ColumnName::ALL
            .into_iter()
            .find(|column| column.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown column '{wanted}'. Available: {}",
                    ColumnName::headers().join(", ")
                )
            })
    }
}
