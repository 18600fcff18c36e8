//! Backup manifest extraction.
//!
//! A backup is a (usually gzip-compressed) tar archive with a `manifest.json`
//! document describing its contents and source platform version. Extraction
//! runs entirely on in-memory byte streams; nothing is unpacked to disk.

use std::io::Read;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::debug;

use crate::errors::ManifestError;

/// Entry name the scan looks for, at any depth inside the archive.
pub const MANIFEST_NAME: &str = "manifest.json";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parsed backup manifest. Every field is optional in the wild; consumers
/// substitute explicit "unknown" placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupManifest {
    /// Home Assistant core version the backup was taken from.
    pub homeassistant: Option<String>,
    pub supervisor: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub addons: Vec<AddonEntry>,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub homeassistant_data: Option<HomeAssistantData>,
}

/// Addon record inside the manifest; older backups list bare slug strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AddonEntry {
    Full {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        slug: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
    Slug(String),
}

impl AddonEntry {
    pub fn slug(&self) -> &str {
        match self {
            AddonEntry::Full { slug, .. } => slug.as_deref().unwrap_or("unknown"),
            AddonEntry::Slug(slug) => slug,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AddonEntry::Full { name, .. } => name.as_deref().unwrap_or("unknown"),
            AddonEntry::Slug(_) => "unknown",
        }
    }

    pub fn version(&self) -> &str {
        match self {
            AddonEntry::Full { version, .. } => version.as_deref().unwrap_or("unknown"),
            AddonEntry::Slug(_) => "unknown",
        }
    }
}

/// Optional platform state block; integration domains may live under either
/// key depending on the producing release.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeAssistantData {
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
}

/// Locate and parse the manifest inside `data`.
///
/// The first entry whose path equals or ends with `manifest.json` wins and
/// the scan stops there. An unreadable archive and a manifest that fails to
/// parse are reported separately from a missing manifest.
pub fn extract_manifest(data: &[u8]) -> Result<BackupManifest, ManifestError> {
    let raw = if data.starts_with(&GZIP_MAGIC) {
        find_manifest_entry(GzDecoder::new(data))?
    } else {
        find_manifest_entry(data)?
    };
    serde_json::from_slice(&raw).map_err(|err| ManifestError::InvalidJson(err.to_string()))
}

fn find_manifest_entry<R: Read>(reader: R) -> Result<Vec<u8>, ManifestError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|err| ManifestError::Corrupt(err.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|err| ManifestError::Corrupt(err.to_string()))?;
        let name = {
            let path = entry
                .path()
                .map_err(|err| ManifestError::Corrupt(err.to_string()))?;
            path.to_string_lossy().into_owned()
        };
        if name == MANIFEST_NAME || name.ends_with(MANIFEST_NAME) {
            debug!(entry = %name, "found backup manifest");
            let mut raw = Vec::new();
            entry
                .read_to_end(&mut raw)
                .map_err(|err| ManifestError::Corrupt(err.to_string()))?;
            return Ok(raw);
        }
    }

    Err(ManifestError::NotFound)
}
