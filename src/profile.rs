//! Declarative per-source mapping tables.
//!
//! A [`SourceProfile`] says, for every canonical field, which raw column to
//! read, which synonyms to collapse, and what to fall back to. Supporting a
//! new survey layout means adding a profile (in code or in a YAML file passed
//! with `--profiles`), never touching the normalizer.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    canonical::{BurnoutCuts, BurnoutLabel, DEFAULT_BURNOUT, StressLabel},
    record::BurnoutLevel,
};

pub const UNKNOWN: &str = "Unknown";
pub const DEFAULT_HOURS_PER_WEEK: f64 = 40.0;

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn default_hours() -> f64 {
    DEFAULT_HOURS_PER_WEEK
}

fn default_burnout() -> BurnoutLevel {
    DEFAULT_BURNOUT
}

fn ten() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueReplacement {
    pub from: String,
    pub to: String,
}

impl ValueReplacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Rule for a free-text field.
///
/// Resolution order: `constant`, then the `column` cell passed through
/// `replace`, then `default`. With `exhaustive` set, cells that match no
/// replacement also resolve to `default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<ValueReplacement>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exhaustive: bool,
    #[serde(default = "unknown")]
    pub default: String,
}

impl TextRule {
    pub fn column(name: &str) -> Self {
        Self {
            column: Some(name.to_string()),
            constant: None,
            replace: Vec::new(),
            exhaustive: false,
            default: unknown(),
        }
    }

    pub fn constant(value: &str) -> Self {
        Self {
            column: None,
            constant: Some(value.to_string()),
            replace: Vec::new(),
            exhaustive: false,
            default: unknown(),
        }
    }

    pub fn with_replacements(mut self, replace: Vec<ValueReplacement>, exhaustive: bool) -> Self {
        self.replace = replace;
        self.exhaustive = exhaustive;
        self
    }

    /// `None` for a cell that matched nothing in an exhaustive table.
    pub fn map_value(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        let folded = trimmed.to_lowercase();
        if let Some(hit) = self
            .replace
            .iter()
            .find(|r| r.from.trim().to_lowercase() == folded)
        {
            return Some(hit.to.clone());
        }
        if self.exhaustive || trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default = "default_hours")]
    pub default: f64,
}

impl NumericRule {
    pub fn column(name: &str) -> Self {
        Self {
            column: Some(name.to_string()),
            default: default_hours(),
        }
    }

    pub fn fixed(default: f64) -> Self {
        Self {
            column: None,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressRule {
    Labels {
        column: String,
        labels: Vec<StressLabel>,
    },
    Numeric {
        column: String,
        #[serde(default = "ten")]
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BurnoutRule {
    Labels {
        column: String,
        labels: Vec<BurnoutLabel>,
        #[serde(default = "default_burnout")]
        default: BurnoutLevel,
    },
    Score {
        column: String,
        #[serde(default)]
        cuts: BurnoutCuts,
        #[serde(default = "default_burnout")]
        default: BurnoutLevel,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub name: String,
    /// Substring of the file name that selects this profile.
    pub matches: String,
    pub role: TextRule,
    pub work_mode: TextRule,
    pub hours_per_week: NumericRule,
    pub stress: StressRule,
    pub burnout: BurnoutRule,
    pub policy: TextRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<TextRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl SourceProfile {
    /// General mental-health survey: no work-mode or hours questions.
    pub fn principal() -> Self {
        Self {
            name: "dataset_principal".into(),
            matches: "dataset_principal".into(),
            role: TextRule::column("Occupation"),
            work_mode: TextRule::constant("Office"),
            hours_per_week: NumericRule::fixed(DEFAULT_HOURS_PER_WEEK),
            stress: StressRule::Labels {
                column: "Growing_Stress".into(),
                labels: vec![StressLabel::new("Yes", 8.0), StressLabel::new("No", 3.0)],
            },
            burnout: BurnoutRule::Labels {
                column: "Mood_Swings".into(),
                labels: BurnoutLabel::level_names(),
                default: DEFAULT_BURNOUT,
            },
            policy: TextRule::column("care_options"),
            segment: None,
            age: None,
            gender: Some("Gender".into()),
        }
    }

    /// Burnout survey with categorical stress levels and regions.
    pub fn burnout() -> Self {
        Self {
            name: "dataset_burnout".into(),
            matches: "dataset_burnout".into(),
            role: TextRule::column("Job_Role"),
            work_mode: TextRule::column("Work_Location"),
            hours_per_week: NumericRule::column("Hours_Worked_Per_Week"),
            stress: StressRule::Labels {
                column: "Stress_Level".into(),
                labels: StressLabel::level_anchors(),
            },
            burnout: BurnoutRule::Labels {
                column: "Stress_Level".into(),
                labels: BurnoutLabel::level_names(),
                default: DEFAULT_BURNOUT,
            },
            policy: TextRule::column("Access_to_Mental_Health_Resources"),
            segment: Some(TextRule::column("Region")),
            age: Some("Age".into()),
            gender: Some("Gender".into()),
        }
    }

    /// Workplace-support survey with numeric stress and burnout scores.
    pub fn workplace() -> Self {
        Self {
            name: "dataset_workplace".into(),
            matches: "dataset_workplace".into(),
            role: TextRule::column("JobRole"),
            work_mode: TextRule::column("RemoteWork"),
            hours_per_week: NumericRule::column("WorkHoursPerWeek"),
            stress: StressRule::Numeric {
                column: "StressLevel".into(),
                max: 10.0,
            },
            burnout: BurnoutRule::Score {
                column: "BurnoutLevel".into(),
                cuts: BurnoutCuts::default(),
                default: DEFAULT_BURNOUT,
            },
            policy: TextRule::column("HasMentalHealthSupport").with_replacements(
                vec![
                    ValueReplacement::new("Yes", "With Support"),
                    ValueReplacement::new("No", "Without Support"),
                ],
                true,
            ),
            segment: Some(TextRule::column("Department")),
            age: Some("Age".into()),
            gender: Some("Gender".into()),
        }
    }

    /// Used for files that match no profile: reads canonical column names as-is.
    pub fn generic() -> Self {
        Self {
            name: "generic".into(),
            matches: String::new(),
            role: TextRule::column("role"),
            work_mode: TextRule::column("work_mode"),
            hours_per_week: NumericRule::column("hours_per_week"),
            stress: StressRule::Numeric {
                column: "stress_score".into(),
                max: 10.0,
            },
            burnout: BurnoutRule::Labels {
                column: "burnout_level".into(),
                labels: BurnoutLabel::level_names(),
                default: DEFAULT_BURNOUT,
            },
            policy: TextRule::column("policy"),
            segment: Some(TextRule::column("segment")),
            age: Some("age".into()),
            gender: Some("gender".into()),
        }
    }

    /// True when `identifier` (a file name or source tag) contains `matches`.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        !self.matches.is_empty()
            && identifier
                .to_lowercase()
                .contains(&self.matches.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    pub profiles: Vec<SourceProfile>,
    #[serde(skip, default = "SourceProfile::generic")]
    generic: SourceProfile,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileSet {
    pub fn new(profiles: Vec<SourceProfile>) -> Self {
        Self {
            profiles,
            generic: SourceProfile::generic(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            SourceProfile::principal(),
            SourceProfile::burnout(),
            SourceProfile::workplace(),
        ])
    }

    /// First profile whose `matches` occurs in `identifier`, else the generic
    /// pass-through profile.
    pub fn resolve(&self, identifier: &str) -> &SourceProfile {
        self.profiles
            .iter()
            .find(|profile| profile.matches_identifier(identifier))
            .unwrap_or(&self.generic)
    }

    /// Resolves by file name so directory names never select a profile.
    pub fn resolve_path(&self, path: &Path) -> &SourceProfile {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.resolve(&file_name)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            ensure!(
                !profile.matches.trim().is_empty(),
                "Profile '{}' must declare a non-empty 'matches' pattern",
                profile.name
            );
            ensure!(
                seen.insert(profile.name.as_str()),
                "Duplicate profile name '{}'",
                profile.name
            );
            if let StressRule::Numeric { max, .. } = &profile.stress {
                ensure!(
                    *max > 0.0,
                    "Profile '{}' stress scale max must be positive",
                    profile.name
                );
            }
            if let BurnoutRule::Score { cuts, .. } = &profile.burnout {
                ensure!(
                    cuts.low_max < cuts.medium_max,
                    "Profile '{}' burnout cuts must satisfy low_max < medium_max",
                    profile.name
                );
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile file {path:?}"))?;
        let set: ProfileSet = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing profile YAML {path:?}"))?;
        set.validate()?;
        Ok(set)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let set: ProfileSet = serde_yaml::from_str(input).context("Parsing profile YAML")?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing profiles to YAML")
    }
}
