use serde::{Deserialize, Serialize};

use super::domain::FormState;

const EXTENUATING_DETAIL_THRESHOLD: usize = 20;

/// The completion rules feeding the progress score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressRule {
    GcsePresent,
    GcseMaths,
    GcseEnglish,
    LevelThreePresent,
    HigherPresent,
    ExtenuatingDetail,
}

impl ProgressRule {
    pub const fn points(self) -> u8 {
        match self {
            ProgressRule::GcsePresent => 20,
            ProgressRule::GcseMaths => 10,
            ProgressRule::GcseEnglish => 10,
            ProgressRule::LevelThreePresent => 30,
            ProgressRule::HigherPresent => 20,
            ProgressRule::ExtenuatingDetail => 10,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ProgressRule::GcsePresent => "At least one GCSE recorded",
            ProgressRule::GcseMaths => "GCSE section includes Maths",
            ProgressRule::GcseEnglish => "GCSE section includes English",
            ProgressRule::LevelThreePresent => "At least one Level 3 qualification",
            ProgressRule::HigherPresent => "At least one higher-level qualification",
            ProgressRule::ExtenuatingDetail => "Extenuating circumstances described",
        }
    }

    fn satisfied(self, state: &FormState) -> bool {
        fn gcse_mentions(state: &FormState, needle: &str) -> bool {
            state
                .gcse
                .iter()
                .any(|record| record.subject.to_lowercase().contains(needle))
        }

        match self {
            ProgressRule::GcsePresent => !state.gcse.is_empty(),
            ProgressRule::GcseMaths => gcse_mentions(state, "math"),
            ProgressRule::GcseEnglish => gcse_mentions(state, "english"),
            ProgressRule::LevelThreePresent => !state.l3.is_empty(),
            ProgressRule::HigherPresent => !state.higher.is_empty(),
            ProgressRule::ExtenuatingDetail => {
                state.extenuating.trim().len() >= EXTENUATING_DETAIL_THRESHOLD
            }
        }
    }
}

const ALL_RULES: [ProgressRule; 6] = [
    ProgressRule::GcsePresent,
    ProgressRule::GcseMaths,
    ProgressRule::GcseEnglish,
    ProgressRule::LevelThreePresent,
    ProgressRule::HigherPresent,
    ProgressRule::ExtenuatingDetail,
];

/// One rule's contribution, kept so the form can explain its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressComponent {
    pub rule: ProgressRule,
    pub points: u8,
    pub satisfied: bool,
}

/// Per-rule audit of the score alongside the clamped total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBreakdown {
    pub components: Vec<ProgressComponent>,
    pub total: u8,
}

impl ProgressBreakdown {
    pub fn of(state: &FormState) -> Self {
        let components: Vec<ProgressComponent> = ALL_RULES
            .iter()
            .map(|&rule| ProgressComponent {
                rule,
                points: rule.points(),
                satisfied: rule.satisfied(state),
            })
            .collect();

        let raw: u32 = components
            .iter()
            .filter(|component| component.satisfied)
            .map(|component| u32::from(component.points))
            .sum();

        // The rule weights sum to exactly 100; the clamp is defensive.
        Self {
            components,
            total: raw.min(100) as u8,
        }
    }
}

/// Pure completion score in `[0, 100]`, recomputed on demand.
pub fn compute_progress(state: &FormState) -> u8 {
    ProgressBreakdown::of(state).total
}
