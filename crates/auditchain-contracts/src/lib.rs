//! # auditchain-contracts
//!
//! Shared types for the auditchain tamper-evident log.
//!
//! All crates in the workspace import from here. No I/O or hashing lives in
//! this crate, only data definitions and error types.

pub mod error;
pub mod event;
pub mod report;

pub use error::{AuditError, AuditResult};
pub use event::{
    ActionOutcome, Checkpoint, Event, Record, RotationAnchor, ACTION_OUTCOME, GENESIS_HASH,
    ROTATION_ANCHOR,
};
pub use report::ReplayReport;

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // ── Event contract ───────────────────────────────────────────────────────

    #[test]
    fn event_rejects_empty_type() {
        let err = Event::new("", 1, Map::new()).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent { .. }));
    }

    #[test]
    fn event_rejects_reserved_field_names() {
        for reserved in ["seq", "prev_hash", "ts", "type", "chain_hash"] {
            let err = Event::new("custom", 1, fields(&[(reserved, json!(1))])).unwrap_err();
            assert!(
                err.to_string().contains(reserved),
                "error for '{reserved}' should name the field, got: {err}"
            );
        }
    }

    #[test]
    fn event_rejects_nested_values() {
        let err = Event::new("custom", 1, fields(&[("list", json!([1, 2]))])).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent { .. }));

        let err = Event::new("custom", 1, fields(&[("obj", json!({"a": 1}))])).unwrap_err();
        assert!(matches!(err, AuditError::InvalidEvent { .. }));
    }

    #[test]
    fn event_keeps_insertion_order() {
        let event = Event::new(
            "custom",
            7,
            fields(&[("zeta", json!(1)), ("alpha", json!(null)), ("mid", json!("x"))]),
        )
        .unwrap();

        let keys: Vec<&str> = event.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    // ── Typed bodies ─────────────────────────────────────────────────────────

    #[test]
    fn action_outcome_pins_schema_order() {
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

        assert_eq!(event.kind(), ACTION_OUTCOME);
        let keys: Vec<&str> = event.fields().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "action",
                "status",
                "message",
                "request_version",
                "has_confirmation_id",
                "payload_len",
                "payload_hash"
            ]
        );
        assert_eq!(event.fields()["payload_hash"], Value::Null);
    }

    #[test]
    fn rotation_anchor_carries_rotated_file() {
        let event = RotationAnchor {
            rotated_file: "/tmp/audit.1700000001.jsonl".into(),
        }
        .into_event(1_700_000_001);

        assert_eq!(event.kind(), ROTATION_ANCHOR);
        assert_eq!(event.fields()["rotated_file"], json!("/tmp/audit.1700000001.jsonl"));
    }

    // ── Checkpoint / errors ──────────────────────────────────────────────────

    #[test]
    fn checkpoint_default_is_genesis() {
        let cp = Checkpoint::default();
        assert_eq!(cp.seq, 0);
        assert_eq!(cp.last_hash, GENESIS_HASH);
        assert!(cp.is_genesis());
    }

    #[test]
    fn checkpoint_json_shape() {
        let cp = Checkpoint {
            seq: 3,
            last_hash: "00000000000000ff".into(),
        };
        assert_eq!(
            serde_json::to_string(&cp).unwrap(),
            r#"{"seq":3,"last_hash":"00000000000000ff"}"#
        );
    }

    #[test]
    fn chain_errors_render_file_and_line() {
        let err = AuditError::SequenceGap {
            file: "audit.jsonl".into(),
            line: 4,
            got: 5,
            expected: 4,
        };
        assert_eq!(
            err.to_string(),
            "audit.jsonl:4: non-consecutive seq (got 5, expected 4)"
        );
        assert!(err.is_integrity_failure());
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn checkpoint_mismatch_is_not_an_integrity_failure() {
        let err = AuditError::CheckpointMismatch {
            found: "seq=2, hash=abc".into(),
            expected_seq: 3,
            expected_hash: "def".into(),
        };
        assert!(err.to_string().starts_with("state mismatch"));
        assert!(!err.is_integrity_failure());
        assert_eq!(err.line(), None);
    }
}
