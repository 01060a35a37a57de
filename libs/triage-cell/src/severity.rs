use serde::{Deserialize, Serialize};
use tracing::warn;

/// Three-level triage outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SeverityRank {
    Low,
    Mild,
    Severe,
}

impl SeverityRank {
    pub fn score(self) -> u32 {
        match self {
            SeverityRank::Low => 20,
            SeverityRank::Mild => 60,
            SeverityRank::Severe => 90,
        }
    }

    /// Parses a classifier label. Unknown or missing labels become `Mild`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("Low") => SeverityRank::Low,
            Some("Mild") => SeverityRank::Mild,
            Some("Severe") => SeverityRank::Severe,
            other => {
                warn!("Invalid severity rank: {:?}, defaulting to Mild", other);
                SeverityRank::Mild
            }
        }
    }
}

/// Doctor-queue priority for a severity score: `ceil(score / 10)` within 1..=10.
pub fn priority_level_for_score(score: u32) -> u8 {
    score.div_ceil(10).clamp(1, 10) as u8
}
