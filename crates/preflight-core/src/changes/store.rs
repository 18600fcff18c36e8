//! Persisted breaking-change store.
//!
//! The full record collection lives in one JSON document
//! (`{"changes": [...], "last_update": ...}`) loaded once at open. Records
//! are append-only and id-unique. Reads share the lock; `update` is the
//! single writer and rewrites the whole file atomically.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{BreakingChange, ChangeFeed, ALL_INTEGRATIONS};
use crate::errors::StoreError;
use crate::fsio;
use crate::version::Version;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChangeDb {
    #[serde(default)]
    changes: Vec<BreakingChange>,
    #[serde(default)]
    last_update: Option<String>,
}

pub struct ChangeStore {
    path: PathBuf,
    state: RwLock<ChangeDb>,
}

impl ChangeStore {
    /// Load the store from `path`. A missing file is an empty store, not an
    /// error; an unreadable or malformed file is.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let db = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<ChangeDb>(&bytes).map_err(|err| {
                StoreError::Decode {
                    path: path.display().to_string(),
                    source: err,
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no change database yet, starting empty");
                ChangeDb::default()
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source: err,
                })
            }
        };
        info!(count = db.changes.len(), "loaded breaking change database");
        Ok(Self {
            path,
            state: RwLock::new(db),
        })
    }

    /// Pull records from `feed`, append the ones whose id is new, stamp the
    /// update time and persist. Returns whether anything was added.
    pub fn update(&self, feed: &dyn ChangeFeed) -> anyhow::Result<bool> {
        let fetched = feed.fetch().context("fetch breaking changes")?;

        let mut db = self.state.write().unwrap();
        let before = db.changes.len();
        for change in fetched {
            if db.changes.iter().any(|existing| existing.id == change.id) {
                continue;
            }
            db.changes.push(change);
        }
        let added = db.changes.len() - before;
        if added == 0 {
            info!("change database already up to date");
            return Ok(false);
        }

        db.last_update = Some(Utc::now().to_rfc3339());
        fsio::write_json_atomic(&self.path, &*db)?;
        info!(added, total = db.changes.len(), "change database updated");
        Ok(true)
    }

    /// Records introduced after `from_version` and at or before `to_version`
    /// (`from < v <= to`) that touch one of `integrations` or are scoped to
    /// every installation.
    ///
    /// Unparseable bounds yield nothing rather than a guess; records with an
    /// unparseable version are skipped.
    pub fn find_applicable(
        &self,
        from_version: &str,
        to_version: &str,
        integrations: &[String],
    ) -> Vec<BreakingChange> {
        let (Ok(from), Ok(to)) = (
            from_version.parse::<Version>(),
            to_version.parse::<Version>(),
        ) else {
            warn!(
                from = from_version,
                to = to_version,
                "unparseable version bounds, skipping breaking change lookup"
            );
            return Vec::new();
        };

        let db = self.state.read().unwrap();
        let matched: Vec<BreakingChange> = db
            .changes
            .iter()
            .filter(|change| {
                let Ok(version) = change.version.parse::<Version>() else {
                    return false;
                };
                from < version
                    && version <= to
                    && (change.integration == ALL_INTEGRATIONS
                        || integrations.iter().any(|i| *i == change.integration))
            })
            .cloned()
            .collect();
        info!(
            count = matched.len(),
            from = from_version,
            to = to_version,
            "matched applicable breaking changes"
        );
        matched
    }

    /// Snapshot of every stored record.
    pub fn all(&self) -> Vec<BreakingChange> {
        self.state.read().unwrap().changes.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap().changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_update(&self) -> Option<String> {
        self.state.read().unwrap().last_update.clone()
    }
}
