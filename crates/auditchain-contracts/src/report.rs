//! Verification report type.

use serde::Serialize;

use crate::{error::AuditError, event::GENESIS_HASH};

/// The result of replaying one log file.
///
/// On failure, `final_seq` / `final_hash` are the last values the chain
/// reached before the offending line, and `error` holds the first
/// inconsistency found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub ok: bool,
    /// `"ok"` on success, otherwise the rendered error.
    pub message: String,
    pub final_seq: u64,
    pub final_hash: String,
    #[serde(skip)]
    pub error: Option<AuditError>,
}

impl ReplayReport {
    pub fn passed(final_seq: u64, final_hash: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: "ok".to_string(),
            final_seq,
            final_hash: final_hash.into(),
            error: None,
        }
    }

    pub fn failed(error: AuditError, final_seq: u64, final_hash: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: error.to_string(),
            final_seq,
            final_hash: final_hash.into(),
            error: Some(error),
        }
    }

    /// A failure before any record was read (e.g. the file is missing).
    pub fn failed_at_start(error: AuditError) -> Self {
        Self::failed(error, 0, GENESIS_HASH)
    }
}
