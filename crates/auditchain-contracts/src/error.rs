//! Error types for the auditchain log.
//!
//! Every fallible operation returns `AuditResult<T>`.  Verification errors
//! carry the file and 1-based line of the first offending record so an
//! operator can diagnose the log without re-running the verifier.

use thiserror::Error;

/// The unified error type for writing, loading, and verifying audit logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    /// A line is not valid JSON, is not an object, or lacks a correctly
    /// typed `seq` / `prev_hash` / `chain_hash`.
    #[error("{file}:{line}: {reason}")]
    MalformedRecord {
        file: String,
        line: usize,
        reason: String,
    },

    /// A record's `seq` does not follow its predecessor by exactly one.
    #[error("{file}:{line}: non-consecutive seq (got {got}, expected {expected})")]
    SequenceGap {
        file: String,
        line: usize,
        got: u64,
        expected: u64,
    },

    /// Broken `prev_hash` linkage, or a stored `chain_hash` that does not
    /// match recomputation.  The latter is the tamper signal.
    #[error("{file}:{line}: {reason}")]
    ChainMismatch {
        file: String,
        line: usize,
        reason: String,
    },

    /// The checkpoint disagrees with the tail of the log.
    ///
    /// This means the cache is stale, not that history is corrupted.
    #[error("state mismatch ({found}) expected (seq={expected_seq}, hash={expected_hash})")]
    CheckpointMismatch {
        found: String,
        expected_seq: u64,
        expected_hash: String,
    },

    /// A log or checkpoint file could not be opened, read, or written.
    #[error("{reason}: {path}")]
    Io { path: String, reason: String },

    /// A producer handed the log an event that breaks the collaborator
    /// contract (empty type, non-scalar field, reserved field name).
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },

    /// The verifier self-test did not behave as expected.
    #[error("self-test failed: {reason}")]
    SelfTestFailed { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl AuditError {
    /// Build an `Io` error from a `std::io::Error` and the path it concerns.
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        let reason = if err.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            err.to_string()
        };
        AuditError::Io {
            path: path.as_ref().display().to_string(),
            reason,
        }
    }

    /// True for errors that indicate corrupted history rather than a stale
    /// cache or an I/O problem.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            AuditError::MalformedRecord { .. }
                | AuditError::SequenceGap { .. }
                | AuditError::ChainMismatch { .. }
        )
    }

    /// The 1-based line of the offending record, for verification errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            AuditError::MalformedRecord { line, .. }
            | AuditError::SequenceGap { line, .. }
            | AuditError::ChainMismatch { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the auditchain crates.
pub type AuditResult<T> = Result<T, AuditError>;
