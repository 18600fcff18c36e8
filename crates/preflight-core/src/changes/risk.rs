//! Risk scoring over matched breaking changes.

use serde::Serialize;

use super::BreakingChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// Validation could not run far enough to score anything.
    Unknown,
}

/// Qualitative verdict over a set of matched changes. Derived, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub message: String,
    pub change_count: usize,
}

/// Sum severity weights and map the total onto a risk level.
///
/// Thresholds: 0-2 low, 3-6 medium, above that high.
pub fn assess_risk(changes: &[BreakingChange]) -> RiskAssessment {
    if changes.is_empty() {
        return RiskAssessment {
            level: RiskLevel::Low,
            score: 0,
            message: "No breaking changes detected".to_string(),
            change_count: 0,
        };
    }

    let score: u32 = changes.iter().map(|change| change.severity.weight()).sum();
    let (level, message) = if score <= 2 {
        (
            RiskLevel::Low,
            "Minor changes detected. Restoration should be safe.",
        )
    } else if score <= 6 {
        (
            RiskLevel::Medium,
            "Some breaking changes detected. Review before restoring.",
        )
    } else {
        (
            RiskLevel::High,
            "Significant breaking changes detected. Restoration may cause issues.",
        )
    };

    RiskAssessment {
        level,
        score,
        message: message.to_string(),
        change_count: changes.len(),
    }
}
