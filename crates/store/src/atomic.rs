//! Whole-file reads and atomic replacement.

use std::io::ErrorKind;
use std::path::Path;

use pipeline::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

fn io_error(artifact: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        artifact: artifact.to_string(),
        source,
    }
}

/// Replaces `path` with `contents`.
///
/// The bytes are written to a sibling temp file with a unique name and then
/// renamed over the target. Concurrent writers never share a temp file.
pub(crate) async fn write_atomic(
    path: &Path,
    contents: &[u8],
    artifact: &str,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(artifact, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_error(artifact, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_error(artifact, e));
    }
    Ok(())
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    artifact: &str,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
        artifact: artifact.to_string(),
        source,
    })?;
    write_atomic(path, &bytes, artifact).await
}

/// Reads a text file; a missing file is [`StoreError::NotFound`].
pub(crate) async fn read_text(path: &Path, artifact: &str) -> Result<String, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
            artifact: artifact.to_string(),
        }),
        Err(e) => Err(io_error(artifact, e)),
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    path: &Path,
    artifact: &str,
) -> Result<T, StoreError> {
    let text = read_text(path, artifact).await?;
    serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
        artifact: artifact.to_string(),
        source,
    })
}

/// File names in `dir`, sorted. `None` if the directory does not exist.
pub(crate) async fn list_files(dir: &Path, artifact: &str) -> Result<Option<Vec<String>>, StoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(artifact, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(artifact, e))? {
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| io_error(artifact, e))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            // Skip temp files left behind by an interrupted write.
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(Some(names))
}
