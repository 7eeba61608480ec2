//! Collapses free-text and locale-variant survey answers into the canonical
//! vocabulary: work modes, 0–10 stress scores, and three-level burnout.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    data::parse_number,
    record::{BurnoutLevel, WorkMode},
};

pub const STRESS_MIN: f64 = 0.0;
pub const STRESS_MAX: f64 = 10.0;
/// Score for missing or unreadable stress answers.
pub const DEFAULT_STRESS: f64 = 5.0;
pub const DEFAULT_BURNOUT: BurnoutLevel = BurnoutLevel::Medium;
/// Fallback for work-mode answers outside [`WORK_MODE_SYNONYMS`].
pub const DEFAULT_WORK_MODE: WorkMode = WorkMode::Onsite;

/// Case-folded, trimmed answer → canonical work mode.
pub const WORK_MODE_SYNONYMS: &[(&str, WorkMode)] = &[
    ("remote", WorkMode::Remote),
    ("yes", WorkMode::Remote),
    ("wfh", WorkMode::Remote),
    ("work from home", WorkMode::Remote),
    ("home", WorkMode::Remote),
    ("home office", WorkMode::Remote),
    ("fully remote", WorkMode::Remote),
    ("remoto", WorkMode::Remote),
    ("teletrabalho", WorkMode::Remote),
    ("hybrid", WorkMode::Hybrid),
    ("híbrido", WorkMode::Hybrid),
    ("hibrido", WorkMode::Hybrid),
    ("híbrida", WorkMode::Hybrid),
    ("sometimes", WorkMode::Hybrid),
    ("partial", WorkMode::Hybrid),
    ("mixed", WorkMode::Hybrid),
    ("onsite", WorkMode::Onsite),
    ("on-site", WorkMode::Onsite),
    ("on site", WorkMode::Onsite),
    ("office", WorkMode::Onsite),
    ("in-office", WorkMode::Onsite),
    ("in office", WorkMode::Onsite),
    ("in-person", WorkMode::Onsite),
    ("presencial", WorkMode::Onsite),
    ("no", WorkMode::Onsite),
    ("unknown", WorkMode::Onsite),
];

fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Synonym lookup only; `None` means the answer is not in the table.
pub fn lookup_work_mode(raw: &str) -> Option<WorkMode> {
    let folded = fold(raw);
    WORK_MODE_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == folded)
        .map(|(_, mode)| *mode)
}

/// Always returns a canonical mode; unknown answers become [`DEFAULT_WORK_MODE`].
pub fn canonicalize_work_mode(raw: &str) -> WorkMode {
    lookup_work_mode(raw).unwrap_or(DEFAULT_WORK_MODE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressLabel {
    pub from: String,
    pub score: f64,
}

impl StressLabel {
    pub fn new(from: &str, score: f64) -> Self {
        Self {
            from: from.to_string(),
            score,
        }
    }

    /// `Low`/`Medium`/`High` anchored at 2/5/8.
    pub fn level_anchors() -> Vec<StressLabel> {
        vec![
            StressLabel::new("Low", 2.0),
            StressLabel::new("Medium", 5.0),
            StressLabel::new("High", 8.0),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StressScale<'a> {
    /// Numeric answers on a `0..=max` scale, rescaled to 0–10.
    Numeric { max: f64 },
    /// Categorical answers mapped to fixed anchors.
    Labels(&'a [StressLabel]),
}

pub fn clip_stress(score: f64) -> f64 {
    score.clamp(STRESS_MIN, STRESS_MAX)
}

/// Stress on the 0–10 scale, or `None` when the answer cannot be read.
pub fn lookup_stress(raw: &str, scale: StressScale<'_>) -> Option<f64> {
    match scale {
        StressScale::Numeric { max } => {
            let value = parse_number(raw)?;
            let rescaled = if max > 0.0 && max != STRESS_MAX {
                value * STRESS_MAX / max
            } else {
                value
            };
            Some(clip_stress(rescaled))
        }
        StressScale::Labels(labels) => {
            let folded = fold(raw);
            labels
                .iter()
                .find(|label| fold(&label.from) == folded)
                .map(|label| clip_stress(label.score))
        }
    }
}

pub fn canonicalize_stress(raw: &str, scale: StressScale<'_>) -> f64 {
    lookup_stress(raw, scale).unwrap_or(DEFAULT_STRESS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnoutLabel {
    pub from: String,
    pub to: BurnoutLevel,
}

impl BurnoutLabel {
    pub fn new(from: &str, to: BurnoutLevel) -> Self {
        Self {
            from: from.to_string(),
            to,
        }
    }

    /// `Low`/`Medium`/`High` mapped onto the matching level.
    pub fn level_names() -> Vec<BurnoutLabel> {
        BurnoutLevel::ALL
            .into_iter()
            .map(|level| {
                let name = level.as_str();
                let mut capitalized = name[..1].to_uppercase();
                capitalized.push_str(&name[1..]);
                BurnoutLabel::new(&capitalized, level)
            })
            .collect()
    }
}

pub fn lookup_burnout_label(raw: &str, labels: &[BurnoutLabel]) -> Option<BurnoutLevel> {
    let folded = fold(raw);
    labels
        .iter()
        .find(|label| fold(&label.from) == folded)
        .map(|label| label.to)
}

/// Cut points for bucketing a 0–10 burnout score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurnoutCuts {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for BurnoutCuts {
    fn default() -> Self {
        Self {
            low_max: 3.0,
            medium_max: 6.0,
        }
    }
}

/// Scores are clipped to 0–10 first; `<= low_max` is low, `<= medium_max` is
/// medium, anything above is high.
pub fn bucket_burnout_score(score: f64, cuts: BurnoutCuts) -> BurnoutLevel {
    let score = clip_stress(score);
    if score <= cuts.low_max {
        BurnoutLevel::Low
    } else if score <= cuts.medium_max {
        BurnoutLevel::Medium
    } else {
        BurnoutLevel::High
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    WorkMode,
    StressScore,
    BurnoutLevel,
    HoursPerWeek,
}

impl CanonicalField {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::WorkMode => "work_mode",
            CanonicalField::StressScore => "stress_score",
            CanonicalField::BurnoutLevel => "burnout_level",
            CanonicalField::HoursPerWeek => "hours_per_week",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tally of answers that fell through to a default while normalizing one source.
#[derive(Debug, Clone, Default)]
pub struct CanonicalizationReport {
    pub source: String,
    counts: BTreeMap<(CanonicalField, String), usize>,
}

impl CanonicalizationReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, field: CanonicalField, raw: &str) {
        let key = if raw.trim().is_empty() {
            "<empty>".to_string()
        } else {
            raw.trim().to_string()
        };
        *self.counts.entry((field, key)).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count_for(&self, field: CanonicalField) -> usize {
        self.counts
            .iter()
            .filter(|((f, _), _)| *f == field)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn entries(&self) -> Vec<(CanonicalField, String, usize)> {
        self.counts
            .iter()
            .map(|((field, value), count)| (*field, value.clone(), *count))
            .collect()
    }
}
