//! Validation report model.
//!
//! Produced fresh per validation call, never persisted. The machine-readable
//! status pairs with a human recommendation the same way the rest of the
//! crate pairs typed results with messages.

use chrono::Utc;
use serde::Serialize;

use crate::analyzer::VersionDiff;
use crate::changes::{BreakingChange, RiskLevel, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Compatible,
    CompatibleWithWarnings,
    Incompatible,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Version,
    BreakingChange,
}

/// One issue or warning surfaced by validation.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupInfoBlock {
    pub name: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-formatted size, e.g. "1.0 MB".
    pub size: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfoBlock {
    pub backup_version: String,
    pub current_version: String,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_diff: Option<VersionDiff>,
    pub months_difference: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationsBlock {
    pub count: usize,
    /// Capped for display; `count` is the real total.
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddonsBlock {
    pub count: usize,
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakingChangesBlock {
    pub count: usize,
    pub risk_score: u32,
    pub risk_message: String,
    pub changes: Vec<BreakingChange>,
}

/// Full validation verdict for one backup.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub backup_id: String,
    pub status: ValidationStatus,
    pub risk_level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_info: Option<BackupInfoBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<VersionInfoBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrations: Option<IntegrationsBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons: Option<AddonsBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaking_changes: Option<BreakingChangesBlock>,
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub timestamp: String,
}

impl ValidationReport {
    /// Terminal error report: validation could not run to a verdict.
    pub fn error(backup_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backup_id: backup_id.into(),
            status: ValidationStatus::Error,
            risk_level: RiskLevel::Unknown,
            error: Some(message.into()),
            backup_info: None,
            version_info: None,
            integrations: None,
            addons: None,
            breaking_changes: None,
            issues: Vec::new(),
            warnings: Vec::new(),
            recommendation: None,
            timestamp: now_rfc3339(),
        }
    }
}

/// Fixed recommendation per (status, risk) tier.
pub fn recommendation(status: ValidationStatus, risk_level: RiskLevel) -> &'static str {
    match (status, risk_level) {
        (ValidationStatus::Incompatible, _) => {
            "Restoration not recommended. Critical compatibility issues detected. \
             Review the issues carefully before proceeding."
        }
        (_, RiskLevel::High) => {
            "Proceed with caution. Significant breaking changes detected that may \
             affect your system. Review all warnings before restoring."
        }
        (_, RiskLevel::Medium) => {
            "Restoration should be safe, but some minor issues were detected. Review \
             the warnings and be prepared to reconfigure affected integrations."
        }
        _ => "Backup appears safe to restore. No significant compatibility issues detected.",
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
