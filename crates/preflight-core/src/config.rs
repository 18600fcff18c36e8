//! Typed add-on configuration.
//!
//! Every field has a declared default; loading substitutes defaults for a
//! missing or unreadable file, and saving sanitizes rather than rejects.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::errors::StoreError;
use crate::fsio;

pub const MIN_RETENTION_DAYS: u32 = 1;
pub const MAX_RETENTION_DAYS: u32 = 365;

/// Automatic backup cadence. Unknown labels fall back to daily at parse
/// time instead of failing the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Schedule {
    pub fn parse(s: &str) -> Self {
        match s {
            "hourly" => Self::Hourly,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Daily,
        }
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Schedule::parse(&label))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonConfig {
    pub auto_backup: bool,
    pub backup_schedule: Schedule,
    /// Days to keep automatic backups, clamped into 1..=365 on save.
    pub backup_retention: u32,
    pub notifications_enabled: bool,
    pub debug_mode: bool,
    pub validate_before_restore: bool,
    pub compression_enabled: bool,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            auto_backup: true,
            backup_schedule: Schedule::Daily,
            backup_retention: 7,
            notifications_enabled: true,
            debug_mode: false,
            validate_before_restore: true,
            compression_enabled: true,
        }
    }
}

impl AddonConfig {
    /// Clamp out-of-range values instead of rejecting them.
    pub fn sanitized(mut self) -> Self {
        self.backup_retention = self
            .backup_retention
            .clamp(MIN_RETENTION_DAYS, MAX_RETENTION_DAYS);
        self
    }
}

/// Flat JSON file holding the add-on configuration.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current configuration. A missing or unreadable file yields the
    /// defaults; a readable file is sanitized field-wise.
    pub fn load(&self) -> AddonConfig {
        match std::fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<AddonConfig>(&bytes) {
                Ok(config) => config.sanitized(),
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "config file unreadable, using defaults");
                    AddonConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => AddonConfig::default(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to read config, using defaults");
                AddonConfig::default()
            }
        }
    }

    /// Sanitize and persist `config` atomically. Returns what was written.
    pub fn save(&self, config: AddonConfig) -> Result<AddonConfig, StoreError> {
        let config = config.sanitized();
        fsio::write_json_atomic(&self.path, &config)?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(config)
    }

    /// Load, apply `mutate`, save.
    pub fn update(
        &self,
        mutate: impl FnOnce(&mut AddonConfig),
    ) -> Result<AddonConfig, StoreError> {
        let mut config = self.load();
        mutate(&mut config);
        self.save(config)
    }

    pub fn reset_to_defaults(&self) -> Result<AddonConfig, StoreError> {
        self.save(AddonConfig::default())
    }

    /// Current configuration as pretty JSON.
    pub fn export(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.load()).map_err(|err| StoreError::Encode {
            path: self.path.display().to_string(),
            source: err,
        })
    }

    /// Replace the configuration from a JSON string. Malformed JSON is the
    /// one rejected input; out-of-range values are still clamped.
    pub fn import(&self, json: &str) -> Result<AddonConfig, StoreError> {
        let config: AddonConfig =
            serde_json::from_str(json).map_err(|err| StoreError::Decode {
                path: self.path.display().to_string(),
                source: err,
            })?;
        self.save(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.json"))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = store_in(&dir).load();
        assert_eq!(config, AddonConfig::default());
        assert_eq!(config.backup_retention, 7);
        assert_eq!(config.backup_schedule, Schedule::Daily);
        assert!(config.validate_before_restore);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("config.json"), b"{broken").unwrap();
        assert_eq!(store.load(), AddonConfig::default());
    }

    #[test]
    fn save_clamps_retention_into_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let saved = store
            .save(AddonConfig {
                backup_retention: 0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(saved.backup_retention, MIN_RETENTION_DAYS);

        let saved = store
            .save(AddonConfig {
                backup_retention: 9999,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(saved.backup_retention, MAX_RETENTION_DAYS);
        assert_eq!(store.load().backup_retention, MAX_RETENTION_DAYS);
    }

    #[test]
    fn unknown_schedule_label_falls_back_to_daily() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            dir.path().join("config.json"),
            br#"{"backup_schedule": "fortnightly", "auto_backup": false}"#,
        )
        .unwrap();
        let config = store.load();
        assert_eq!(config.backup_schedule, Schedule::Daily);
        assert!(!config.auto_backup);
    }

    #[test]
    fn partial_documents_fall_back_field_wise() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("config.json"), br#"{"debug_mode": true}"#).unwrap();
        let config = store.load();
        assert!(config.debug_mode);
        assert_eq!(config.backup_retention, 7);
        assert!(config.auto_backup);
    }

    #[test]
    fn save_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = AddonConfig {
            auto_backup: false,
            backup_schedule: Schedule::Weekly,
            backup_retention: 30,
            notifications_enabled: false,
            debug_mode: true,
            validate_before_restore: false,
            compression_enabled: false,
        };
        store.save(config.clone()).unwrap();
        assert_eq!(store.load(), config);
    }

    #[test]
    fn import_rejects_malformed_json_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.import("not json").is_err());

        let imported = store
            .import(r#"{"backup_retention": 500, "backup_schedule": "weekly"}"#)
            .unwrap();
        assert_eq!(imported.backup_retention, MAX_RETENTION_DAYS);
        assert_eq!(imported.backup_schedule, Schedule::Weekly);
    }

    #[test]
    fn reset_returns_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .update(|config| config.debug_mode = true)
            .unwrap();
        assert!(store.load().debug_mode);
        store.reset_to_defaults().unwrap();
        assert_eq!(store.load(), AddonConfig::default());
    }
}
