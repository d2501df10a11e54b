//! # auditchain-verify
//!
//! Independent verification of auditchain logs.
//!
//! This crate provides [`engine::replay`], which recomputes every chain
//! hash in a JSONL log and stops at the first inconsistency, and
//! [`engine::verify_state`], which cross-checks a checkpoint against the
//! replayed tail.  A chain failure (corrupted history) and a checkpoint
//! failure (stale cache) are always reported as different errors.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use auditchain_verify::verify_log;
//!
//! let report = verify_log(Path::new("audit.jsonl"), Path::new("audit.jsonl.state"));
//! if !report.ok {
//!     eprintln!("{}", report.message);
//! }
//! ```

pub mod engine;
pub mod selftest;

pub use engine::{replay, verify_log, verify_state};
pub use selftest::run_self_test;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use serde_json::{Map, Value};

    use auditchain_contracts::{
        ActionOutcome, AuditError, Checkpoint, Record, GENESIS_HASH,
    };
    use auditchain_core::{canonical, CheckpointStore, LogWriter};
    use auditchain_store::{state_path_for, FileCheckpointStore};

    use crate::selftest::{tamper, write_fixture};
    use crate::{replay, run_self_test, verify_log, verify_state};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const ACTIONS: [&str; 6] = [
        "ping",
        "volume_up",
        "calendar_list_day",
        "email_unread_count",
        "weather_today",
        "package_install",
    ];

    /// Write `n` action records to a fresh log and return its path and the
    /// records the writer acknowledged.
    fn build_log(dir: &Path, n: usize) -> (PathBuf, Vec<Record>) {
        let log = dir.join("audit.jsonl");
        let store = FileCheckpointStore::for_log_path(&log);
        let mut writer = LogWriter::open(&log, Box::new(store)).unwrap();

        let records = (0..n)
            .map(|i| {
                let event = ActionOutcome {
                    action: ACTIONS[i % ACTIONS.len()].to_string(),
                    status: "ok".into(),
                    message: format!("step {i} ✓"),
                    request_version: 1,
                    has_confirmation_id: i % 2 == 0,
                    payload_len: i as u64,
                    payload_hash: (i % 3 != 0).then_some(i as u64 * 7919),
                }
                .into_event(1_700_000_000 + i as i64);
                writer.append(&event).unwrap()
            })
            .collect();
        (log, records)
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn write_lines(path: &Path, lines: &[String]) {
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(path, contents).unwrap();
    }

    fn mutate(value: &Value) -> Value {
        match value {
            Value::Null => Value::from(1),
            Value::Bool(b) => Value::Bool(!b),
            Value::Number(n) => Value::from(n.as_u64().unwrap_or(0) + 1),
            Value::String(s) => Value::from(format!("{s}x")),
            other => other.clone(),
        }
    }

    fn error_of(path: &Path) -> AuditError {
        replay(path).error.expect("replay should have failed")
    }

    // ── Round trip ────────────────────────────────────────────────────────────

    #[test]
    fn chain_of_n_records_replays_ok() {
        let dir = tempfile::tempdir().unwrap();
        for n in [1, 2, 17] {
            let sub = dir.path().join(n.to_string());
            fs::create_dir(&sub).unwrap();
            let (log, records) = build_log(&sub, n);

            let report = replay(&log);
            assert!(report.ok, "{}", report.message);
            assert_eq!(report.message, "ok");
            assert_eq!(report.final_seq, n as u64);
            assert_eq!(report.final_hash, records.last().unwrap().chain_hash);
        }
    }

    #[test]
    fn replay_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 5);

        assert_eq!(replay(&log), replay(&log));
    }

    #[test]
    fn fixture_chain_matches_reference_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        write_fixture(&log).unwrap();

        let lines = read_lines(&log);
        assert_eq!(
            lines[1],
            r#"{"seq":2,"prev_hash":"2b4320f1f11dd563","ts":1700000001,"type":"rotation_anchor","rotated_file":"/tmp/audit.1700000001.jsonl","chain_hash":"1d4dae01c7e186a9"}"#
        );

        let report = verify_log(&log, &state_path_for(&log));
        assert!(report.ok, "{}", report.message);
        assert_eq!(report.final_seq, 3);
        assert_eq!(report.final_hash, "3713d7b0741849ff");
    }

    #[test]
    fn empty_log_is_ok_at_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        fs::write(&log, "\n\n").unwrap();

        let report = verify_log(&log, &state_path_for(&log));
        assert!(report.ok, "{}", report.message);
        assert_eq!(report.final_seq, 0);
        assert_eq!(report.final_hash, GENESIS_HASH);
    }

    #[test]
    fn zero_byte_log_is_ok_at_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        fs::File::create(&log).unwrap();

        let report = verify_log(&log, &state_path_for(&log));
        assert!(report.ok, "{}", report.message);
        assert_eq!(report.message, "ok");
        assert_eq!(report.final_seq, 0);
        assert_eq!(report.final_hash, GENESIS_HASH);
    }

    #[test]
    fn blank_lines_are_skipped_but_counted() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 3);
        let mut lines = read_lines(&log);
        lines.insert(1, String::new());
        lines.insert(2, "   ".to_string());
        write_lines(&log, &lines);

        assert!(replay(&log).ok);

        // Third record now sits on line 5.
        tamper(&log, "calendar_list_day", "calendar_add_event").unwrap();
        assert_eq!(error_of(&log).line(), Some(5));
    }

    // ── Tamper detection ──────────────────────────────────────────────────────

    #[test]
    fn end_to_end_tamper_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        write_fixture(&log).unwrap();
        assert!(verify_log(&log, &state_path_for(&log)).ok);

        tamper(&log, "\"calendar_list_day\"", "\"calendar_add_event\"").unwrap();

        let report = replay(&log);
        assert!(!report.ok);
        assert_eq!(report.final_seq, 2, "tail stops before the bad record");
        match report.error {
            Some(AuditError::ChainMismatch { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("chain hash mismatch"), "got: {reason}");
            }
            other => panic!("expected ChainMismatch, got {other:?}"),
        }
        assert!(report.message.contains("audit.jsonl:3: chain hash mismatch"));
    }

    #[test]
    fn mutating_any_field_of_any_record_is_detected_at_that_line() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 4);
        let original = read_lines(&log);

        for (idx, line) in original.iter().enumerate() {
            let parsed: Map<String, Value> = serde_json::from_str(line).unwrap();
            for key in parsed.keys() {
                let mut altered = parsed.clone();
                altered[key] = mutate(&parsed[key]);
                let mut lines = original.clone();
                lines[idx] = serde_json::to_string(&altered).unwrap();
                write_lines(&log, &lines);

                let err = error_of(&log);
                assert_eq!(
                    err.line(),
                    Some(idx + 1),
                    "mutating '{key}' on line {} reported {err}",
                    idx + 1
                );
                assert!(err.is_integrity_failure());
            }
        }
    }

    #[test]
    fn mutating_chain_hash_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let (log, records) = build_log(dir.path(), 2);
        tamper(&log, &records[1].chain_hash, "0000000000000000").unwrap();

        match error_of(&log) {
            AuditError::ChainMismatch { line: 2, reason, .. } => {
                assert!(reason.starts_with("chain hash mismatch"), "got: {reason}");
            }
            other => panic!("expected ChainMismatch on line 2, got {other:?}"),
        }
    }

    #[test]
    fn swapping_records_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 4);
        let original = read_lines(&log);

        let mut lines = original.clone();
        lines.swap(1, 2);
        write_lines(&log, &lines);
        assert!(matches!(
            error_of(&log),
            AuditError::SequenceGap { line: 2, got: 3, expected: 2, .. }
        ));

        let mut lines = original;
        lines.swap(0, 1);
        write_lines(&log, &lines);
        match error_of(&log) {
            AuditError::ChainMismatch { line: 1, reason, .. } => {
                assert!(reason.starts_with("prev_hash mismatch"), "got: {reason}");
            }
            other => panic!("expected prev_hash mismatch on line 1, got {other:?}"),
        }
    }

    #[test]
    fn deleting_a_middle_record_is_a_sequence_gap() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 5);
        let mut lines = read_lines(&log);
        lines.remove(2);
        write_lines(&log, &lines);

        let err = error_of(&log);
        assert_eq!(
            err,
            AuditError::SequenceGap {
                file: log.display().to_string(),
                line: 3,
                got: 4,
                expected: 3,
            }
        );
        assert!(err
            .to_string()
            .ends_with("non-consecutive seq (got 4, expected 3)"));
    }

    #[test]
    fn later_errors_are_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 5);
        let mut lines = read_lines(&log);
        lines[1] = lines[1].replace("volume_up", "volume_down");
        lines[3] = "garbage".to_string();
        write_lines(&log, &lines);

        let report = replay(&log);
        assert_eq!(report.error.as_ref().and_then(AuditError::line), Some(2));
        assert_eq!(report.final_seq, 1);
    }

    // ── Malformed input ───────────────────────────────────────────────────────

    #[test]
    fn malformed_lines_are_reported_with_reason() {
        let cases = [
            ("{not json", "invalid json"),
            ("[1,2,3]", "event is not object"),
            (r#"{"seq":1,"prev_hash":"genesis"}"#, "missing seq/prev_hash/chain_hash"),
            (r#"{"seq":0,"prev_hash":"genesis","chain_hash":"x"}"#, "invalid seq"),
            (r#"{"seq":"1","prev_hash":"genesis","chain_hash":"x"}"#, "invalid seq"),
            (r#"{"seq":-1,"prev_hash":"genesis","chain_hash":"x"}"#, "invalid seq"),
            (r#"{"seq":1,"prev_hash":null,"chain_hash":"x"}"#, "invalid hash fields"),
            (r#"{"seq":1,"prev_hash":"genesis","chain_hash":7}"#, "invalid hash fields"),
        ];

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        for (line, expected) in cases {
            fs::write(&log, format!("{line}\n")).unwrap();
            match error_of(&log) {
                AuditError::MalformedRecord { line: 1, reason, .. } => {
                    assert!(reason.contains(expected), "{line}: got {reason}");
                }
                other => panic!("{line}: expected MalformedRecord, got {other:?}"),
            }
        }
    }

    #[test]
    fn record_after_max_seq_is_malformed_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("audit.jsonl");
        let event = ActionOutcome {
            action: "ping".into(),
            status: "ok".into(),
            message: "pong".into(),
            request_version: 1,
            has_confirmation_id: false,
            payload_len: 0,
            payload_hash: None,
        }
        .into_event(1_700_000_000);

        let last = canonical::seal(u64::MAX, GENESIS_HASH, &event).unwrap();
        write_lines(&log, &[last.line.clone()]);
        let report = replay(&log);
        assert!(report.ok, "a lone record at u64::MAX is well-formed: {}", report.message);
        assert_eq!(report.final_seq, u64::MAX);

        let next = canonical::seal(1, &last.record.chain_hash, &event).unwrap();
        write_lines(&log, &[last.line, next.line]);
        match error_of(&log) {
            AuditError::MalformedRecord { line: 2, reason, .. } => {
                assert!(reason.contains("seq overflow"), "got: {reason}");
            }
            other => panic!("expected MalformedRecord at line 2, got {other:?}"),
        }
    }

    #[test]
    fn missing_log_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let report = replay(&dir.path().join("absent.jsonl"));

        assert!(!report.ok);
        assert!(matches!(report.error, Some(AuditError::Io { .. })));
        assert!(report.message.starts_with("log file not found"), "{}", report.message);
    }

    // ── Checkpoint cross-check ────────────────────────────────────────────────

    #[test]
    fn checkpoint_tracks_the_last_append() {
        let dir = tempfile::tempdir().unwrap();
        let (log, records) = build_log(dir.path(), 6);
        let last = records.last().unwrap();

        assert_eq!(
            FileCheckpointStore::for_log_path(&log).get(),
            Checkpoint {
                seq: 6,
                last_hash: last.chain_hash.clone()
            }
        );
        assert!(verify_state(&state_path_for(&log), 6, &last.chain_hash).is_ok());
    }

    #[test]
    fn wrong_checkpoint_fails_state_check_only() {
        let dir = tempfile::tempdir().unwrap();
        let (log, records) = build_log(dir.path(), 3);
        let store = FileCheckpointStore::for_log_path(&log);
        store
            .set(&Checkpoint {
                seq: 2,
                last_hash: records[1].chain_hash.clone(),
            })
            .unwrap();

        let chain_only = replay(&log);
        assert!(chain_only.ok, "history is intact: {}", chain_only.message);

        let err = verify_state(store.path(), chain_only.final_seq, &chain_only.final_hash)
            .unwrap_err();
        assert!(matches!(err, AuditError::CheckpointMismatch { .. }));
        assert!(!err.is_integrity_failure());
        assert!(err.to_string().starts_with("state mismatch"));

        let full = verify_log(&log, store.path());
        assert!(!full.ok);
        assert_eq!(full.final_seq, 3);
    }

    #[test]
    fn missing_checkpoint_only_matches_empty_chain() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("absent.state");

        assert!(verify_state(&state, 0, GENESIS_HASH).is_ok());

        let err = verify_state(&state, 1, "2b4320f1f11dd563").unwrap_err();
        assert!(err.to_string().contains("state file not found"), "got: {err}");
    }

    #[test]
    fn garbage_checkpoint_is_a_state_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("audit.state");
        fs::write(&state, "{\"seq\":").unwrap();

        let err = verify_state(&state, 1, "2b4320f1f11dd563").unwrap_err();
        match err {
            AuditError::CheckpointMismatch { found, .. } => {
                assert!(found.contains("invalid state json"), "got: {found}");
            }
            other => panic!("expected CheckpointMismatch, got {other:?}"),
        }
    }

    // ── Rotation ──────────────────────────────────────────────────────────────

    #[test]
    fn rotated_files_verify_independently() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = build_log(dir.path(), 3);
        let archive = dir.path().join("audit.1700000100.jsonl");

        let mut writer =
            LogWriter::open(&log, Box::new(FileCheckpointStore::for_log_path(&log))).unwrap();
        writer.rotate(&archive, 1_700_000_100).unwrap();
        let fresh = writer
            .append(
                &ActionOutcome {
                    action: "ping".into(),
                    status: "ok".into(),
                    message: "pong".into(),
                    request_version: 1,
                    has_confirmation_id: false,
                    payload_len: 0,
                    payload_hash: None,
                }
                .into_event(1_700_000_101),
            )
            .unwrap();

        let archived = verify_log(&archive, &state_path_for(&archive));
        assert!(archived.ok, "{}", archived.message);
        assert_eq!(archived.final_seq, 4, "three records plus the anchor");

        let active = verify_log(&log, &state_path_for(&log));
        assert!(active.ok, "{}", active.message);
        assert_eq!(active.final_seq, 1);
        assert_eq!(active.final_hash, fresh.chain_hash);
    }

    // ── Self-test ─────────────────────────────────────────────────────────────

    #[test]
    fn self_test_passes() {
        run_self_test().unwrap();
    }
}
