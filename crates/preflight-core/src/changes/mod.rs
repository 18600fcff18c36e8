//! Breaking-change knowledge base.
//!
//! Known incompatibilities introduced at specific platform versions, scoped
//! to an integration domain (or `all`). The store persists them as a single
//! JSON document and answers range queries during validation.

mod feed;
mod risk;
mod store;

pub use feed::{ChangeFeed, CuratedFeed};
pub use risk::{assess_risk, RiskAssessment, RiskLevel};
pub use store::ChangeStore;

use serde::{Deserialize, Serialize};

/// Integration sentinel matching every installation.
pub const ALL_INTEGRATIONS: &str = "all";

/// How disruptive a breaking change is expected to be. Records from outside
/// feeds may carry labels we do not know; those score like `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Risk weight used by [`assess_risk`].
    pub fn weight(self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium | Severity::Unknown => 3,
            Severity::High => 5,
        }
    }
}

/// One known breaking change. Identity is `id`; the store never holds two
/// records with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingChange {
    pub id: String,
    /// Platform version that introduced the change.
    pub version: String,
    /// Affected integration domain, or [`ALL_INTEGRATIONS`].
    pub integration: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_round_trips_lowercase() {
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, r#""high""#);
        assert_eq!(serde_json::from_str::<Severity>(&json).unwrap(), Severity::High);
    }

    #[test]
    fn unrecognized_severity_labels_fall_back_to_unknown() {
        let severity: Severity = serde_json::from_str(r#""catastrophic""#).unwrap();
        assert_eq!(severity, Severity::Unknown);
        assert_eq!(severity.weight(), 3);
    }
}
