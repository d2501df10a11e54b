//! Event and record types.
//!
//! An `Event` is what a producer hands the writer: a `type` discriminator,
//! a timestamp, and an ordered map of scalar fields.  A `Record` is the
//! event after the writer has placed it in the chain.
//!
//! `ActionOutcome` and `RotationAnchor` pin the field order for the two
//! event types the agent emits, so the bytes that get hashed never depend on
//! how a caller happened to build its map.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuditError, AuditResult};

/// The `prev_hash` of the first record in every chain.
pub const GENESIS_HASH: &str = "genesis";

/// Field names the writer owns.  A producer's field map must not use them.
pub const RESERVED_FIELDS: [&str; 5] = ["seq", "prev_hash", "ts", "type", "chain_hash"];

/// `type` of an executed-action record.
pub const ACTION_OUTCOME: &str = "action_outcome";

/// `type` of the record that closes a chain before its file is rotated out.
pub const ROTATION_ANCHOR: &str = "rotation_anchor";

/// A producer-supplied event, not yet placed in a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    ts: i64,
    kind: String,
    fields: Map<String, Value>,
}

impl Event {
    /// Build an event, enforcing the collaborator contract.
    ///
    /// `kind` must be non-empty; every field value must be a JSON scalar;
    /// no field may reuse a name from [`RESERVED_FIELDS`].  `fields` keeps
    /// its insertion order, which becomes the order the fields are hashed in.
    pub fn new(kind: impl Into<String>, ts: i64, fields: Map<String, Value>) -> AuditResult<Self> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(AuditError::InvalidEvent {
                reason: "event type must be a non-empty string".to_string(),
            });
        }
        for (name, value) in &fields {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                return Err(AuditError::InvalidEvent {
                    reason: format!("field '{name}' is reserved for the writer"),
                });
            }
            if value.is_array() || value.is_object() {
                return Err(AuditError::InvalidEvent {
                    reason: format!("field '{name}' must be a JSON scalar"),
                });
            }
        }
        Ok(Self { ts, kind, fields })
    }

    /// Build an event stamped with the current Unix time in seconds.
    pub fn now(kind: impl Into<String>, fields: Map<String, Value>) -> AuditResult<Self> {
        Self::new(kind, now_epoch_secs(), fields)
    }

    pub fn ts(&self) -> i64 {
        self.ts
    }

    /// The `type` discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Type-specific fields in canonical order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Current Unix time in whole seconds.
pub fn now_epoch_secs() -> i64 {
    Utc::now().timestamp()
}

/// The outcome of one dispatched action.
///
/// Raw payload text never enters the log; only its length and FNV-1a hash
/// are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    pub status: String,
    pub message: String,
    pub request_version: u32,
    pub has_confirmation_id: bool,
    pub payload_len: u64,
    pub payload_hash: Option<u64>,
}

impl ActionOutcome {
    /// Convert to an `Event` with fields in schema order:
    /// `action`, `status`, `message`, `request_version`,
    /// `has_confirmation_id`, `payload_len`, `payload_hash`.
    pub fn into_event(self, ts: i64) -> Event {
        let mut fields = Map::new();
        fields.insert("action".into(), Value::from(self.action));
        fields.insert("status".into(), Value::from(self.status));
        fields.insert("message".into(), Value::from(self.message));
        fields.insert("request_version".into(), Value::from(self.request_version));
        fields.insert("has_confirmation_id".into(), Value::from(self.has_confirmation_id));
        fields.insert("payload_len".into(), Value::from(self.payload_len));
        fields.insert(
            "payload_hash".into(),
            self.payload_hash.map_or(Value::Null, Value::from),
        );
        Event {
            ts,
            kind: ACTION_OUTCOME.to_string(),
            fields,
        }
    }
}

/// In-band pointer to the file a chain was rotated out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationAnchor {
    pub rotated_file: String,
}

impl RotationAnchor {
    pub fn into_event(self, ts: i64) -> Event {
        let mut fields = Map::new();
        fields.insert("rotated_file".into(), Value::from(self.rotated_file));
        Event {
            ts,
            kind: ROTATION_ANCHOR.to_string(),
            fields,
        }
    }
}

/// An event after it has been placed in the chain and written.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based position within its file.
    pub seq: u64,
    /// `chain_hash` of the preceding record, or [`GENESIS_HASH`].
    pub prev_hash: String,
    pub event: Event,
    /// 16 lowercase hex digits.
    pub chain_hash: String,
}

/// Cached `(seq, chain_hash)` of the most recently appended record.
///
/// The log file is authoritative; the checkpoint only saves a full replay
/// on restart and gives the verifier something to cross-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub seq: u64,
    pub last_hash: String,
}

impl Checkpoint {
    /// The empty-log state: `{seq: 0, last_hash: "genesis"}`.
    pub fn genesis() -> Self {
        Self {
            seq: 0,
            last_hash: GENESIS_HASH.to_string(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.seq == 0 && self.last_hash == GENESIS_HASH
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::genesis()
    }
}
