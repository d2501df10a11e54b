//! Canonical record serialization.
//!
//! The canonical form of a record is compact JSON (no whitespace, `,` and
//! `:` separators, non-ASCII left as UTF-8) with fields in assembly order:
//! `seq`, `prev_hash`, `ts`, `type`, then the type-specific fields in the
//! order the event carries them.  A writer and a verifier must agree on
//! these bytes exactly or their chain hashes diverge.
//!
//! Field order survives parsing because the workspace builds `serde_json`
//! with `preserve_order`.

use serde_json::{Map, Value};

use auditchain_contracts::{AuditError, AuditResult, Event, Record};

use crate::chain::chain_hash;

/// Name of the field the writer appends last.
pub const CHAIN_HASH_FIELD: &str = "chain_hash";

/// Assemble a record's fields, excluding `chain_hash`, in schema order.
pub fn assemble(seq: u64, prev_hash: &str, event: &Event) -> Map<String, Value> {
    let mut map = Map::with_capacity(event.fields().len() + 5);
    map.insert("seq".into(), Value::from(seq));
    map.insert("prev_hash".into(), Value::from(prev_hash));
    map.insert("ts".into(), Value::from(event.ts()));
    map.insert("type".into(), Value::from(event.kind()));
    for (name, value) in event.fields() {
        map.insert(name.clone(), value.clone());
    }
    map
}

/// Serialize a field map to its canonical JSON string.
pub fn to_canonical_json(fields: &Map<String, Value>) -> AuditResult<String> {
    serde_json::to_string(fields).map_err(|e| AuditError::InvalidEvent {
        reason: format!("record is not serializable: {e}"),
    })
}

/// Remove `chain_hash` from a parsed record without disturbing the order of
/// the remaining fields.
pub fn strip_chain_hash(fields: &mut Map<String, Value>) -> Option<Value> {
    fields.shift_remove(CHAIN_HASH_FIELD)
}

/// A record placed in the chain together with the exact line to write.
#[derive(Debug, Clone)]
pub struct SealedRecord {
    pub record: Record,
    /// Canonical JSON including `chain_hash`, without the trailing newline.
    pub line: String,
}

/// Place `event` at `seq` after `prev_hash`: serialize, hash, and append
/// `chain_hash` as the final field.
pub fn seal(seq: u64, prev_hash: &str, event: &Event) -> AuditResult<SealedRecord> {
    let mut fields = assemble(seq, prev_hash, event);
    let hash = chain_hash(seq, prev_hash, &to_canonical_json(&fields)?);
    fields.insert(CHAIN_HASH_FIELD.into(), Value::from(hash.as_str()));
    let line = to_canonical_json(&fields)?;

    Ok(SealedRecord {
        record: Record {
            seq,
            prev_hash: prev_hash.to_string(),
            event: event.clone(),
            chain_hash: hash,
        },
        line,
    })
}
