//! Atomic JSON file helpers shared by the state stores

use crate::error::{Error, Result};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;

/// Read a file, mapping "not found" to `None`
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::state(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

/// Serialize `value` and write it to `path` via a temp file and rename
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            Error::state(format!(
                "Failed to create state directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &contents)
        .await
        .map_err(|e| Error::state(format!("Failed to write {}: {e}", temp_path.display())))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

    Ok(())
}
