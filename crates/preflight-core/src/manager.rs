//! Backup operations over the supervisor collaborator.
//!
//! [`BackupManager`] composes the analyzer, the breaking-change store and the
//! supervisor client into the operations the API layer exposes. Validation
//! never propagates a fault to its caller: every internal failure folds into
//! a `status = error` report.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::analyzer::{self, VersionDiff};
use crate::changes::{self, ChangeStore, RiskLevel, Severity};
use crate::errors::{ApiError, ValidationError};
use crate::report::{
    self, AddonsBlock, BackupInfoBlock, BreakingChangesBlock, Finding, FindingKind,
    IntegrationsBlock, ValidationReport, ValidationStatus, VersionInfoBlock,
};
use crate::supervisor::{DetailAddon, SupervisorApi};

/// Backups older than this many release-months draw a version warning.
const STALE_MONTHS_THRESHOLD: u32 = 6;

const INTEGRATION_DISPLAY_LIMIT: usize = 20;
const ADDON_DISPLAY_LIMIT: usize = 10;

/// One row of `list_backups`, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct BackupListing {
    pub id: String,
    pub name: String,
    pub date: String,
    pub size: String,
    pub size_bytes: f64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub protected: bool,
    pub compressed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupDetails {
    pub id: String,
    pub name: String,
    pub date: String,
    pub size: String,
    pub size_bytes: f64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub protected: bool,
    pub compressed: bool,
    pub homeassistant: Option<String>,
    pub addons: Vec<DetailAddon>,
    pub folders: Vec<String>,
    pub repositories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub backup_id: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct RestoreOutcome {
    pub backup_id: String,
    pub message: String,
    /// Verdict of the pre-restore validation run.
    pub validation: ValidationReport,
    pub timestamp: String,
}

pub struct BackupManager {
    api: Arc<dyn SupervisorApi>,
    changes: Arc<ChangeStore>,
}

impl BackupManager {
    pub fn new(api: Arc<dyn SupervisorApi>, changes: Arc<ChangeStore>) -> Self {
        Self { api, changes }
    }

    pub async fn list_backups(&self) -> Result<Vec<BackupListing>, ApiError> {
        let mut listings: Vec<BackupListing> = self
            .api
            .list_backups()
            .await?
            .into_iter()
            .map(|entry| BackupListing {
                id: entry.slug,
                name: entry.name,
                date: entry.date,
                size: format_size(entry.size),
                size_bytes: entry.size,
                kind: entry.kind,
                protected: entry.protected,
                compressed: entry.compressed,
            })
            .collect();
        listings.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(listings)
    }

    pub async fn backup_details(&self, backup_id: &str) -> Result<Option<BackupDetails>, ApiError> {
        let Some(detail) = self.api.backup_info(backup_id).await? else {
            return Ok(None);
        };
        Ok(Some(BackupDetails {
            id: detail.slug,
            name: detail.name,
            date: detail.date,
            size: format_size(detail.size),
            size_bytes: detail.size,
            kind: detail.kind,
            protected: detail.protected,
            compressed: detail.compressed,
            homeassistant: detail.homeassistant,
            addons: detail.addons,
            folders: detail.folders,
            repositories: detail.repositories,
        }))
    }

    pub async fn create_backup(
        &self,
        name: &str,
        password: Option<&str>,
    ) -> Result<CreateOutcome, ApiError> {
        info!(name, "creating backup");
        let slug = self.api.create_backup(name, password).await?;
        Ok(CreateOutcome {
            backup_id: slug,
            message: "Backup created successfully".to_string(),
            timestamp: report::now_rfc3339(),
        })
    }

    /// Validate `backup_id` against the running system. Infallible by
    /// contract: fetch, analysis and comparison failures all come back as a
    /// `status = error` report.
    pub async fn validate_backup(&self, backup_id: &str) -> ValidationReport {
        match self.try_validate(backup_id).await {
            Ok(report) => report,
            Err(err) => {
                error!(backup_id, %err, "backup validation failed");
                ValidationReport::error(backup_id, err.to_string())
            }
        }
    }

    async fn try_validate(&self, backup_id: &str) -> Result<ValidationReport, ValidationError> {
        info!(backup_id, "validating backup");

        // The two fetches have no data dependency; issue them together.
        let (archive, current_version) = tokio::try_join!(
            self.api.download_backup(backup_id),
            self.api.core_version(),
        )?;

        let summary = analyzer::analyze(&archive)?;
        let backup_version = summary.homeassistant_version.clone();

        info!(backup = %backup_version, current = %current_version, "comparing platform versions");
        let comparison = analyzer::compare_versions(&backup_version, &current_version);

        let matched =
            self.changes
                .find_applicable(&backup_version, &current_version, &summary.integrations);
        let risk = changes::assess_risk(&matched);

        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        if !comparison.compatible && comparison.diff == Some(VersionDiff::Newer) {
            issues.push(Finding {
                kind: FindingKind::Version,
                severity: Severity::High,
                message: format!(
                    "Backup is from a newer version ({backup_version}) than current \
                     ({current_version}). Restoration not recommended."
                ),
                integration: None,
                description: None,
                url: None,
            });
        } else if comparison.total_months_diff > STALE_MONTHS_THRESHOLD {
            warnings.push(Finding {
                kind: FindingKind::Version,
                severity: Severity::Medium,
                message: format!(
                    "Backup is {} months old. Significant changes may have occurred.",
                    comparison.total_months_diff
                ),
                integration: None,
                description: None,
                url: None,
            });
        }

        for change in &matched {
            let finding = Finding {
                kind: FindingKind::BreakingChange,
                severity: change.severity,
                message: change.title.clone(),
                integration: Some(change.integration.clone()),
                description: Some(change.description.clone()),
                url: Some(change.url.clone()),
            };
            if change.severity == Severity::High {
                issues.push(finding);
            } else {
                warnings.push(finding);
            }
        }

        let (status, risk_level) = if !issues.is_empty() {
            (ValidationStatus::Incompatible, RiskLevel::High)
        } else if risk.level == RiskLevel::High {
            (ValidationStatus::CompatibleWithWarnings, RiskLevel::High)
        } else if !warnings.is_empty() || risk.level == RiskLevel::Medium {
            (ValidationStatus::CompatibleWithWarnings, RiskLevel::Medium)
        } else {
            (ValidationStatus::Compatible, RiskLevel::Low)
        };

        Ok(ValidationReport {
            backup_id: backup_id.to_string(),
            status,
            risk_level,
            error: None,
            backup_info: Some(BackupInfoBlock {
                name: summary.backup_name.clone(),
                date: summary.backup_date.clone(),
                kind: summary.backup_type.clone(),
                size: format_size(summary.backup_size),
            }),
            version_info: Some(VersionInfoBlock {
                backup_version,
                current_version,
                compatible: comparison.compatible,
                version_diff: comparison.diff,
                months_difference: comparison.total_months_diff,
            }),
            integrations: Some(IntegrationsBlock {
                count: summary.integration_count(),
                list: summary
                    .integrations
                    .iter()
                    .take(INTEGRATION_DISPLAY_LIMIT)
                    .cloned()
                    .collect(),
            }),
            addons: Some(AddonsBlock {
                count: summary.addon_count(),
                list: summary
                    .addons
                    .iter()
                    .take(ADDON_DISPLAY_LIMIT)
                    .map(|addon| addon.name.clone())
                    .collect(),
            }),
            breaking_changes: Some(BreakingChangesBlock {
                count: matched.len(),
                risk_score: risk.score,
                risk_message: risk.message.clone(),
                changes: matched,
            }),
            issues,
            warnings,
            recommendation: Some(report::recommendation(status, risk_level).to_string()),
            timestamp: report::now_rfc3339(),
        })
    }

    /// Validate first, then restore regardless of the verdict. An
    /// incompatible verdict is logged, not enforced; the caller gets the
    /// validation alongside the ack and decides what to surface.
    pub async fn restore_backup(
        &self,
        backup_id: &str,
        password: Option<&str>,
    ) -> Result<RestoreOutcome, ApiError> {
        info!(backup_id, "restoring backup");
        let validation = self.validate_backup(backup_id).await;
        if validation.status == ValidationStatus::Incompatible {
            warn!(backup_id, "restoring a backup flagged incompatible");
        }
        self.api.restore_backup(backup_id, password).await?;
        Ok(RestoreOutcome {
            backup_id: backup_id.to_string(),
            message: "Backup restore initiated".to_string(),
            validation,
            timestamp: report::now_rfc3339(),
        })
    }

    pub async fn delete_backup(&self, backup_id: &str) -> Result<(), ApiError> {
        info!(backup_id, "deleting backup");
        self.api.delete_backup(backup_id).await
    }
}

/// Human-readable size with one decimal, B through PB.
pub fn format_size(size_bytes: f64) -> String {
    let mut size = size_bytes;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_steps_through_units() {
        assert_eq!(format_size(0.0), "0.0 B");
        assert_eq!(format_size(512.0), "512.0 B");
        assert_eq!(format_size(2048.0), "2.0 KB");
        assert_eq!(format_size(1_572_864.0), "1.5 MB");
        assert_eq!(format_size(2.5 * 1024.0 * 1024.0 * 1024.0), "2.5 GB");
    }
}
