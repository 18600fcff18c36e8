//! Whole-file JSON persistence.

use std::path::Path;

use serde::Serialize;

use crate::errors::StoreError;

/// Serialize `value` and atomically replace `path` with it (temp file in the
/// same directory, then rename), so readers never observe a partial write.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    use std::io::Write;

    let display = path.display().to_string();
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir).map_err(|err| StoreError::Write {
            path: display.clone(),
            source: err,
        })?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|err| StoreError::Encode {
        path: display.clone(),
        source: err,
    })?;

    let dir = parent.unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|err| StoreError::Write {
        path: display.clone(),
        source: err,
    })?;
    tmp.write_all(&json).map_err(|err| StoreError::Write {
        path: display.clone(),
        source: err,
    })?;
    tmp.persist(path).map_err(|err| StoreError::Write {
        path: display,
        source: err.error,
    })?;
    Ok(())
}
