//! File-backed checkpoint store.
//!
//! The checkpoint is a single compact JSON object,
//! `{"seq":<uint>,"last_hash":"<hex or genesis>"}`, conventionally stored
//! next to its log at `<log_path>.state`.
//!
//! Writes go to `<path>.tmp`, are fsynced, then renamed over the live file,
//! so a reader sees the old checkpoint or the new one and nothing between.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use auditchain_contracts::{AuditError, AuditResult, Checkpoint};
use auditchain_core::CheckpointStore;

/// Conventional checkpoint location for a log: `<log_path>.state`.
pub fn state_path_for(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(".state");
    PathBuf::from(name)
}

/// A `CheckpointStore` persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Store the checkpoint at exactly `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the checkpoint at `<log_path>.state`.
    pub fn for_log_path(log_path: impl AsRef<Path>) -> Self {
        Self::new(state_path_for(log_path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint strictly.
    ///
    /// Returns `Ok(None)` when the file is absent or empty, and an error
    /// when it exists but cannot be read or parsed.  `get()` is the lenient
    /// counterpart used by the writer.
    pub fn load(&self) -> AuditResult<Option<Checkpoint>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuditError::io(&self.path, &e)),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| AuditError::MalformedRecord {
                file: self.path.display().to_string(),
                line: 1,
                reason: format!("invalid state json ({e})"),
            })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> AuditResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = File::open(parent).map_err(|e| AuditError::io(parent, &e))?;
        dir.sync_all().map_err(|e| AuditError::io(parent, &e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> AuditResult<()> {
    Ok(())
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self) -> Checkpoint {
        match self.load() {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => Checkpoint::genesis(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unusable checkpoint");
                Checkpoint::genesis()
            }
        }
    }

    fn set(&self, checkpoint: &Checkpoint) -> AuditResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| AuditError::io(dir, &e))?;
        }

        let payload = serde_json::to_vec(checkpoint).map_err(|e| AuditError::Io {
            path: self.path.display().to_string(),
            reason: format!("checkpoint serialize: {e}"),
        })?;

        let tmp = self.tmp_path();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| AuditError::io(&tmp, &e))?;
        file.write_all(&payload).map_err(|e| AuditError::io(&tmp, &e))?;
        file.sync_all().map_err(|e| AuditError::io(&tmp, &e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| AuditError::io(&self.path, &e))?;

        sync_parent_dir(&self.path)?;

        debug!(path = %self.path.display(), seq = checkpoint.seq, "checkpoint persisted");
        Ok(())
    }

    fn clear(&self) -> AuditResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuditError::io(&self.path, &e)),
        }
    }

    fn for_log(&self, log_path: &Path) -> Box<dyn CheckpointStore> {
        Box::new(Self::for_log_path(log_path))
    }
}
