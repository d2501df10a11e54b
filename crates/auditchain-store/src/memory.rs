//! In-memory implementation of `CheckpointStore`.
//!
//! `InMemoryCheckpointStore` keeps the checkpoint behind an
//! `Arc<Mutex<_>>`, so clones share one value.  Useful for embedding the
//! writer where durability of the cache does not matter (the log is still
//! authoritative) and for tests that want to inspect or corrupt the cache.

use std::path::Path;
use std::sync::{Arc, Mutex};

use auditchain_contracts::{AuditError, AuditResult, Checkpoint};
use auditchain_core::CheckpointStore;

/// A `CheckpointStore` held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointStore {
    pub(crate) state: Arc<Mutex<Option<Checkpoint>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, or `None` if nothing has been set.
    pub fn snapshot(&self) -> Option<Checkpoint> {
        self.state.lock().ok().and_then(|state| state.clone())
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn get(&self) -> Checkpoint {
        self.snapshot().unwrap_or_default()
    }

    fn set(&self, checkpoint: &Checkpoint) -> AuditResult<()> {
        let mut state = self.state.lock().map_err(|e| AuditError::Io {
            path: "<memory>".to_string(),
            reason: format!("checkpoint lock poisoned: {e}"),
        })?;
        *state = Some(checkpoint.clone());
        Ok(())
    }

    fn clear(&self) -> AuditResult<()> {
        let mut state = self.state.lock().map_err(|e| AuditError::Io {
            path: "<memory>".to_string(),
            reason: format!("checkpoint lock poisoned: {e}"),
        })?;
        *state = None;
        Ok(())
    }

    /// A fresh, independent store; the archived log gets its own value.
    fn for_log(&self, _log_path: &Path) -> Box<dyn CheckpointStore> {
        Box::new(Self::new())
    }
}
