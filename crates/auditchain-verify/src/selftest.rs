//! Deterministic end-to-end check of writer and verifier.
//!
//! Builds a three-record chain in a throwaway directory, verifies it and
//! its checkpoint, then rewrites one `action` value without fixing the hash
//! and confirms the verifier now rejects the third line.

use std::fs;
use std::path::Path;

use tracing::info;

use auditchain_contracts::{ActionOutcome, AuditError, AuditResult, RotationAnchor};
use auditchain_core::LogWriter;
use auditchain_store::FileCheckpointStore;

use crate::engine::{replay, verify_log};

const ORIGINAL_ACTION: &str = "calendar_list_day";
const TAMPERED_ACTION: &str = "calendar_add_event";

/// Write the fixture chain to `log_path` (checkpoint at `<log_path>.state`).
pub fn write_fixture(log_path: &Path) -> AuditResult<()> {
    let store = FileCheckpointStore::for_log_path(log_path);
    let mut writer = LogWriter::open(log_path, Box::new(store))?;

    writer.append(
        &ActionOutcome {
            action: "ping".into(),
            status: "ok".into(),
            message: "pong".into(),
            request_version: 1,
            has_confirmation_id: false,
            payload_len: 0,
            payload_hash: None,
        }
        .into_event(1_700_000_000),
    )?;
    writer.append(
        &RotationAnchor {
            rotated_file: "/tmp/audit.1700000001.jsonl".into(),
        }
        .into_event(1_700_000_001),
    )?;
    writer.append(
        &ActionOutcome {
            action: ORIGINAL_ACTION.into(),
            status: "ok".into(),
            message: "Events for 2026-02-17".into(),
            request_version: 1,
            has_confirmation_id: false,
            payload_len: 5,
            payload_hash: Some(1234),
        }
        .into_event(1_700_000_002),
    )?;
    Ok(())
}

/// Replace the first occurrence of `from` with `to` in the log, leaving
/// every stored hash as it was.
pub fn tamper(log_path: &Path, from: &str, to: &str) -> AuditResult<()> {
    let contents = fs::read_to_string(log_path).map_err(|e| AuditError::io(log_path, &e))?;
    fs::write(log_path, contents.replacen(from, to, 1)).map_err(|e| AuditError::io(log_path, &e))
}

/// Run the self-test.  `Ok(())` means the intact chain verified and the
/// tampered chain was rejected at line 3 with a chain hash mismatch.
pub fn run_self_test() -> AuditResult<()> {
    let dir = tempfile::Builder::new()
        .prefix("auditchain-self-test-")
        .tempdir()
        .map_err(|e| AuditError::io(std::env::temp_dir(), &e))?;
    let log = dir.path().join("audit.jsonl");
    let state = dir.path().join("audit.jsonl.state");

    write_fixture(&log)?;

    let report = verify_log(&log, &state);
    if let Some(err) = report.error {
        return Err(err);
    }
    if report.final_seq != 3 {
        return Err(self_test_failure(format!(
            "fixture replayed to seq {}, expected 3",
            report.final_seq
        )));
    }

    tamper(&log, ORIGINAL_ACTION, TAMPERED_ACTION)?;

    match replay(&log).error {
        Some(AuditError::ChainMismatch { line: 3, reason, .. })
            if reason.starts_with("chain hash mismatch") =>
        {
            info!(reason = %reason, "tamper detected as expected");
            Ok(())
        }
        Some(other) => Err(self_test_failure(format!(
            "tamper reported unexpectedly: {other}"
        ))),
        None => Err(self_test_failure(
            "tamper detection did not fail".to_string(),
        )),
    }
}

fn self_test_failure(reason: String) -> AuditError {
    AuditError::SelfTestFailed { reason }
}
