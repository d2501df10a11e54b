//! Seam traits for the log writer.
//!
//! - `CheckpointStore`: durable cache of the last committed `(seq, hash)`
//! - `RotationPolicy`:  decides when the active file should be rotated out
//!
//! Both are injected into `LogWriter`, so each logical log (including one
//! started after a rotation) owns its own checkpoint instance.

use std::path::Path;

use auditchain_contracts::{AuditResult, Checkpoint};

/// A durable cache of the last committed record's `(seq, chain_hash)`.
///
/// The log file is always authoritative.  A store that loses or corrupts
/// its value only costs a tail re-read on the next open.
pub trait CheckpointStore: Send + Sync {
    /// Return the cached checkpoint.
    ///
    /// A missing, empty, or unparsable checkpoint is the normal empty-log
    /// state and yields [`Checkpoint::genesis`]; this never fails.
    fn get(&self) -> Checkpoint;

    /// Persist `checkpoint`, replacing the previous value atomically.
    ///
    /// A concurrent reader sees either the old or the new value, never a
    /// torn one.
    fn set(&self, checkpoint: &Checkpoint) -> AuditResult<()>;

    /// Forget the cached value so `get()` returns genesis again.
    fn clear(&self) -> AuditResult<()>;

    /// Open an independent store of the same kind for the log at `log_path`.
    ///
    /// Used on rotation to hand the archived file its own checkpoint.
    fn for_log(&self, log_path: &Path) -> Box<dyn CheckpointStore>;
}

/// Size counters for the active log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Length of the file in bytes.
    pub bytes: u64,
    /// Number of records in the file's chain.
    pub records: u64,
}

/// Decides whether the active log should be rotated before the next append.
pub trait RotationPolicy: Send + Sync {
    fn should_rotate(&self, stats: &LogStats) -> bool;
}
