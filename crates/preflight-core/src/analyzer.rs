//! Backup content analysis.
//!
//! Turns raw archive bytes into a [`BackupSummary`] and compares the backup's
//! platform version against the running system.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::info;

use crate::errors::ManifestError;
use crate::manifest::{self, BackupManifest};
use crate::version::Version;

/// Integration domains present on every installation, always unioned into
/// the resolved set.
pub const CORE_INTEGRATIONS: [&str; 3] = ["homeassistant", "default_config", "system_health"];

/// Known addon slug to integration domain mappings, used when the manifest
/// carries no explicit integration list.
const ADDON_INTEGRATIONS: [(&str, &str); 7] = [
    ("mosquitto", "mqtt"),
    ("mariadb", "mysql"),
    ("influxdb", "influxdb"),
    ("grafana", "grafana"),
    ("node-red", "node_red"),
    ("esphome", "esphome"),
    ("zigbee2mqtt", "mqtt"),
];

#[derive(Debug, Clone, Serialize)]
pub struct AddonInfo {
    pub name: String,
    pub slug: String,
    pub version: String,
}

/// Structured view of a backup, derived fresh from the archive on every
/// validation call.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub homeassistant_version: String,
    pub supervisor_version: String,
    pub backup_name: String,
    pub backup_date: String,
    pub backup_type: String,
    pub backup_size: f64,
    pub addons: Vec<AddonInfo>,
    pub folders: Vec<String>,
    /// Deduplicated, lexicographically sorted integration domains.
    pub integrations: Vec<String>,
}

impl BackupSummary {
    pub fn addon_count(&self) -> usize {
        self.addons.len()
    }

    pub fn integration_count(&self) -> usize {
        self.integrations.len()
    }
}

/// Extract and summarize the manifest embedded in `data`.
pub fn analyze(data: &[u8]) -> Result<BackupSummary, ManifestError> {
    let manifest = manifest::extract_manifest(data)?;
    let summary = summarize(&manifest);
    info!(version = %summary.homeassistant_version, "backup analysis complete");
    Ok(summary)
}

fn summarize(manifest: &BackupManifest) -> BackupSummary {
    let unknown = || "unknown".to_string();
    BackupSummary {
        homeassistant_version: manifest.homeassistant.clone().unwrap_or_else(unknown),
        supervisor_version: manifest.supervisor.clone().unwrap_or_else(unknown),
        backup_name: manifest.name.clone().unwrap_or_else(|| "Unknown".to_string()),
        backup_date: manifest.date.clone().unwrap_or_else(unknown),
        backup_type: manifest.kind.clone().unwrap_or_else(unknown),
        backup_size: manifest.size,
        addons: manifest
            .addons
            .iter()
            .map(|addon| AddonInfo {
                name: addon.name().to_string(),
                slug: addon.slug().to_string(),
                version: addon.version().to_string(),
            })
            .collect(),
        folders: manifest.folders.clone(),
        integrations: resolve_integrations(manifest),
    }
}

fn resolve_integrations(manifest: &BackupManifest) -> Vec<String> {
    let mut integrations: Vec<String> = manifest
        .homeassistant_data
        .as_ref()
        .map(|data| {
            if !data.integrations.is_empty() {
                data.integrations.clone()
            } else {
                data.components.clone()
            }
        })
        .unwrap_or_default();

    if integrations.is_empty() {
        for addon in &manifest.addons {
            let slug = addon.slug();
            if let Some((_, domain)) = ADDON_INTEGRATIONS.iter().find(|(s, _)| *s == slug) {
                integrations.push((*domain).to_string());
            }
        }
    }

    for core in CORE_INTEGRATIONS {
        integrations.push(core.to_string());
    }
    integrations.sort();
    integrations.dedup();
    integrations
}

/// Relative position of the backup version against the running system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionDiff {
    Older,
    Newer,
    Same,
}

/// Outcome of comparing two version strings. When either side fails to
/// parse, `compatible` is false, `diff` is absent and `reason` says why.
#[derive(Debug, Clone, Serialize)]
pub struct VersionComparison {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<VersionDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub backup_version: String,
    pub current_version: String,
    pub year_diff: u32,
    pub month_diff: u32,
    /// Linear approximation (`year_diff * 12 + month_diff`). Not true
    /// calendar distance when year and month differ together; kept that way
    /// on purpose.
    pub total_months_diff: u32,
}

/// Compare the backup's platform version against the current one.
///
/// Restoring a backup from a newer release than the running system is never
/// compatible; same-or-older is.
pub fn compare_versions(backup_version: &str, current_version: &str) -> VersionComparison {
    let (Ok(backup), Ok(current)) = (
        backup_version.parse::<Version>(),
        current_version.parse::<Version>(),
    ) else {
        return VersionComparison {
            compatible: false,
            diff: None,
            reason: Some("could not parse version numbers".to_string()),
            backup_version: backup_version.to_string(),
            current_version: current_version.to_string(),
            year_diff: 0,
            month_diff: 0,
            total_months_diff: 0,
        };
    };

    let diff = match backup.cmp(&current) {
        Ordering::Less => VersionDiff::Older,
        Ordering::Greater => VersionDiff::Newer,
        Ordering::Equal => VersionDiff::Same,
    };
    let year_diff = backup.year.abs_diff(current.year);
    let month_diff = backup.month.abs_diff(current.month);

    VersionComparison {
        compatible: matches!(diff, VersionDiff::Same | VersionDiff::Older),
        diff: Some(diff),
        reason: None,
        backup_version: backup_version.to_string(),
        current_version: current_version.to_string(),
        year_diff,
        month_diff,
        total_months_diff: year_diff * 12 + month_diff,
    }
}
