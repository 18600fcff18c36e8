//! End-to-end validation pipeline tests against an in-memory supervisor.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use preflight_core::changes::{ChangeStore, CuratedFeed, RiskLevel};
use preflight_core::errors::ApiError;
use preflight_core::manager::BackupManager;
use preflight_core::report::ValidationStatus;
use preflight_core::supervisor::{BackupDetail, BackupEntry, SupervisorApi};

struct FakeSupervisor {
    archive: Result<Vec<u8>, String>,
    version: String,
    backups: Vec<BackupEntry>,
}

impl FakeSupervisor {
    fn serving(archive: Vec<u8>, version: &str) -> Self {
        Self {
            archive: Ok(archive),
            version: version.to_string(),
            backups: Vec::new(),
        }
    }

    fn failing_download(message: &str) -> Self {
        Self {
            archive: Err(message.to_string()),
            version: "2024.10.1".to_string(),
            backups: Vec::new(),
        }
    }
}

#[async_trait]
impl SupervisorApi for FakeSupervisor {
    async fn list_backups(&self) -> Result<Vec<BackupEntry>, ApiError> {
        Ok(self.backups.clone())
    }

    async fn backup_info(&self, _backup_id: &str) -> Result<Option<BackupDetail>, ApiError> {
        Ok(None)
    }

    async fn download_backup(&self, _backup_id: &str) -> Result<Vec<u8>, ApiError> {
        self.archive.clone().map_err(|body| ApiError::Status {
            status: 502,
            body,
        })
    }

    async fn core_version(&self) -> Result<String, ApiError> {
        Ok(self.version.clone())
    }

    async fn create_backup(
        &self,
        _name: &str,
        _password: Option<&str>,
    ) -> Result<String, ApiError> {
        Ok("new-slug".to_string())
    }

    async fn restore_backup(
        &self,
        _backup_id: &str,
        _password: Option<&str>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn delete_backup(&self, _backup_id: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

fn tar_gz_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    let tar = builder.into_inner().unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn archive_with_manifest(manifest: &str) -> Vec<u8> {
    tar_gz_with(&[("manifest.json", manifest.as_bytes())])
}

fn manager_with(api: FakeSupervisor, dir: &tempfile::TempDir) -> BackupManager {
    let store = ChangeStore::open(dir.path().join("breaking_changes.json")).unwrap();
    store.update(&CuratedFeed).unwrap();
    BackupManager::new(Arc::new(api), Arc::new(store))
}

#[tokio::test]
async fn high_severity_breaking_change_makes_backup_incompatible() {
    let manifest = r#"{
        "homeassistant": "2024.5.0",
        "name": "Spring",
        "date": "2024-05-01T00:00:00+00:00",
        "type": "full",
        "size": 1048576,
        "addons": [{"name": "Zigbee2MQTT", "slug": "zigbee2mqtt", "version": "1.35.0"}],
        "homeassistant_data": {"integrations": ["mqtt", "zha"]}
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(
        FakeSupervisor::serving(archive_with_manifest(manifest), "2024.10.1"),
        &dir,
    );

    let report = manager.validate_backup("slug1").await;

    assert_eq!(report.status, ValidationStatus::Incompatible);
    assert_eq!(report.risk_level, RiskLevel::High);

    let version_info = report.version_info.as_ref().unwrap();
    assert!(version_info.compatible);
    assert_eq!(version_info.months_difference, 5);

    let integrations = report.integrations.as_ref().unwrap();
    assert!(integrations.list.contains(&"mqtt".to_string()));
    assert!(integrations.list.contains(&"zha".to_string()));

    // mqtt 2024.10 and zha 2024.9 are in range; esphome 2024.8 is not ours
    let changes = report.breaking_changes.as_ref().unwrap();
    assert_eq!(changes.count, 2);
    assert!(changes.changes.iter().any(|c| c.id == "mqtt_2024_10"));
    assert!(changes.changes.iter().any(|c| c.id == "zha_2024_9"));
    assert!(!changes.changes.iter().any(|c| c.id == "esphome_2024_8"));

    // the high-severity zha record is the single issue, mqtt the warning
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report
        .recommendation
        .as_ref()
        .unwrap()
        .contains("not recommended"));
}

#[tokio::test]
async fn integrations_inferred_from_addon_slugs() {
    let manifest = r#"{
        "homeassistant": "2024.9.2",
        "name": "Weekly",
        "type": "full",
        "size": 2048,
        "addons": [{"name": "Zigbee2MQTT", "slug": "zigbee2mqtt", "version": "1.35.0"}]
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(
        FakeSupervisor::serving(archive_with_manifest(manifest), "2024.10.1"),
        &dir,
    );

    let report = manager.validate_backup("slug2").await;

    let integrations = report.integrations.as_ref().unwrap();
    assert_eq!(
        integrations.list,
        vec!["default_config", "homeassistant", "mqtt", "system_health"]
    );

    // only the medium mqtt record matches: warnings, not issues
    let changes = report.breaking_changes.as_ref().unwrap();
    assert_eq!(changes.count, 1);
    assert_eq!(changes.risk_score, 3);
    assert_eq!(report.status, ValidationStatus::CompatibleWithWarnings);
    assert_eq!(report.risk_level, RiskLevel::Medium);
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn backup_from_newer_release_is_incompatible() {
    let manifest = r#"{"homeassistant": "2025.1.0", "name": "Future", "type": "full"}"#;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(
        FakeSupervisor::serving(archive_with_manifest(manifest), "2024.12.5"),
        &dir,
    );

    let report = manager.validate_backup("slug3").await;

    assert_eq!(report.status, ValidationStatus::Incompatible);
    assert_eq!(report.risk_level, RiskLevel::High);
    let version_info = report.version_info.as_ref().unwrap();
    assert!(!version_info.compatible);
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].message.contains("newer version"));
}

#[tokio::test]
async fn old_compatible_backup_draws_a_staleness_warning() {
    let manifest = r#"{"homeassistant": "2024.1.0", "name": "January", "type": "full"}"#;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(
        FakeSupervisor::serving(archive_with_manifest(manifest), "2024.10.0"),
        &dir,
    );

    let report = manager.validate_backup("slug4").await;

    assert_eq!(report.status, ValidationStatus::CompatibleWithWarnings);
    assert_eq!(report.risk_level, RiskLevel::Medium);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message.contains("9 months old"));
}

#[tokio::test]
async fn download_failure_folds_into_an_error_report() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(FakeSupervisor::failing_download("backup unavailable"), &dir);

    let report = manager.validate_backup("slug5").await;

    assert_eq!(report.status, ValidationStatus::Error);
    assert_eq!(report.risk_level, RiskLevel::Unknown);
    assert!(report.error.as_ref().unwrap().contains("backup unavailable"));
    assert!(report.backup_info.is_none());
}

#[tokio::test]
async fn missing_manifest_and_corrupt_manifest_report_differently() {
    let dir = tempfile::tempdir().unwrap();

    let no_manifest = tar_gz_with(&[("data/config.yaml", b"hello: world")]);
    let manager = manager_with(FakeSupervisor::serving(no_manifest, "2024.10.1"), &dir);
    let missing = manager.validate_backup("slug6").await;
    assert_eq!(missing.status, ValidationStatus::Error);
    assert!(missing.error.as_ref().unwrap().contains("no manifest.json"));

    let bad_json = tar_gz_with(&[("manifest.json", b"{broken")]);
    let manager = manager_with(FakeSupervisor::serving(bad_json, "2024.10.1"), &dir);
    let corrupt = manager.validate_backup("slug7").await;
    assert_eq!(corrupt.status, ValidationStatus::Error);
    assert!(corrupt
        .error
        .as_ref()
        .unwrap()
        .contains("could not be parsed"));
    assert_ne!(missing.error, corrupt.error);
}

#[tokio::test]
async fn restore_carries_the_validation_verdict() {
    let manifest = r#"{"homeassistant": "2024.10.1", "name": "Current", "type": "full"}"#;
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(
        FakeSupervisor::serving(archive_with_manifest(manifest), "2024.10.1"),
        &dir,
    );

    let outcome = manager.restore_backup("slug8", None).await.unwrap();
    assert_eq!(outcome.message, "Backup restore initiated");
    assert_eq!(outcome.validation.status, ValidationStatus::Compatible);
    assert_eq!(outcome.validation.risk_level, RiskLevel::Low);
}

#[tokio::test]
async fn list_backups_sorts_newest_first_with_formatted_sizes() {
    let entry = |slug: &str, date: &str, size: f64| BackupEntry {
        slug: slug.to_string(),
        name: slug.to_string(),
        date: date.to_string(),
        size,
        kind: Some("full".to_string()),
        protected: false,
        compressed: true,
    };
    let api = FakeSupervisor {
        archive: Err("unused".to_string()),
        version: "2024.10.1".to_string(),
        backups: vec![
            entry("old", "2024-01-01T00:00:00+00:00", 1024.0),
            entry("new", "2024-06-01T00:00:00+00:00", 1_572_864.0),
        ],
    };
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_with(api, &dir);

    let listings = manager.list_backups().await.unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].id, "new");
    assert_eq!(listings[0].size, "1.5 MB");
    assert_eq!(listings[1].id, "old");
    assert_eq!(listings[1].size, "1.0 KB");
}
