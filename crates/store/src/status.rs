//! The durable pipeline status record.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use pipeline::{PipelineStatus, StatusStore, StoreError};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::atomic::{read_json, write_json};

/// File name of the status record inside the data directory.
pub const STATUS_FILE: &str = "pipeline_status.json";

/// Advisory lock held by the process that owns the status record.
pub const STATUS_LOCK_FILE: &str = "pipeline_status.json.lock";

/// Reads the persisted status without taking ownership of it.
///
/// A missing file reads as [`PipelineStatus::idle`]. Nothing is rewritten, so
/// this is safe to call while a server owns the record.
pub async fn read_status_snapshot(data_dir: &Path) -> Result<PipelineStatus, StoreError> {
    match read_json(&data_dir.join(STATUS_FILE), STATUS_FILE).await {
        Err(e) if e.is_not_found() => Ok(PipelineStatus::idle()),
        other => other,
    }
}

/// A [`StatusStore`] that serves reads from memory and mirrors every write to
/// `pipeline_status.json`.
///
/// Writers are serialized; the file is replaced atomically before the cached
/// value changes, so memory and disk agree after every successful `set`.
/// Only one store per data directory can be open at a time, across processes;
/// the lock is released when the store is dropped.
#[derive(Debug)]
pub struct FileStatusStore {
    path: PathBuf,
    current: RwLock<PipelineStatus>,
    writer: Mutex<()>,
    _lock: File,
}

impl FileStatusStore {
    /// Opens the record in `data_dir`, taking ownership of it.
    ///
    /// Fails with [`StoreError::Locked`] while another store holds the
    /// directory, leaving the record untouched. Once the lock is held, a
    /// persisted `running` record can only be left over from a process that
    /// stopped mid-run; it is rewritten as [`PipelineStatus::interrupted`].
    /// An unparseable record fails with [`StoreError::Corrupt`].
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let lock = acquire_lock(data_dir)?;
        let path = data_dir.join(STATUS_FILE);
        let mut status = read_status_snapshot(data_dir).await?;

        if status.is_running() {
            warn!(
                path = %path.display(),
                message = %status.message,
                "Found an unfinished pipeline run; marking it as failed"
            );
            status = PipelineStatus::interrupted();
            write_json(&path, &status, STATUS_FILE).await?;
        }

        info!(path = %path.display(), state = %status.state, "Opened pipeline status");

        Ok(Self {
            path,
            current: RwLock::new(status),
            writer: Mutex::new(()),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn acquire_lock(data_dir: &Path) -> Result<File, StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        artifact: STATUS_LOCK_FILE.to_string(),
        source,
    };
    std::fs::create_dir_all(data_dir).map_err(io_err)?;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(data_dir.join(STATUS_LOCK_FILE))
        .map_err(io_err)?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(StoreError::Locked {
                artifact: STATUS_FILE.to_string(),
            })
        }
        Err(e) => Err(io_err(e)),
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn get(&self) -> Result<PipelineStatus, StoreError> {
        Ok(self.current.read().await.clone())
    }

    async fn set(&self, status: PipelineStatus) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        write_json(&self.path, &status, STATUS_FILE).await?;
        *self.current.write().await = status;
        Ok(())
    }
}
