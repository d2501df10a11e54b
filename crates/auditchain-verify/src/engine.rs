//! Log replay and checkpoint cross-checking.
//!
//! `replay` is a short-circuiting fold over the non-blank lines of a log,
//! with an accumulator starting at `(0, "genesis")`.  Each line must:
//!
//! 1. parse as a JSON object with a positive integer `seq` and string
//!    `prev_hash` / `chain_hash`;
//! 2. follow its predecessor's `seq` by exactly one (from the second
//!    record on);
//! 3. carry the accumulator's hash as `prev_hash`;
//! 4. hash, with `chain_hash` stripped and the rest re-serialized
//!    canonically, to its stored `chain_hash`.
//!
//! The first failure stops the fold and is reported with its file and
//! 1-based line.  `verify_state` is a separate check of the checkpoint
//! against the replayed tail; its failure means a stale cache, not
//! corrupted history.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use auditchain_contracts::{AuditError, AuditResult, Checkpoint, ReplayReport, GENESIS_HASH};
use auditchain_core::{canonical, chain_hash};
use auditchain_store::FileCheckpointStore;

/// Replay `path` and report the chain tail it reached.
///
/// Reads the file as it stands when opened; records appended during the
/// replay may or may not be seen.
pub fn replay(path: &Path) -> ReplayReport {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ReplayReport::failed_at_start(AuditError::Io {
                path: path.display().to_string(),
                reason: "log file not found".to_string(),
            });
        }
        Err(e) => return ReplayReport::failed_at_start(AuditError::io(path, &e)),
    };

    let file_name = path.display().to_string();
    let mut tail = Checkpoint::genesis();
    let mut first = true;

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let err = AuditError::MalformedRecord {
                    file: file_name.clone(),
                    line: line_no,
                    reason: format!("unreadable line ({e})"),
                };
                return fail(err, tail);
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match check_record(&file_name, line_no, line, &tail, first) {
            Ok(next) => {
                tail = next;
                first = false;
            }
            Err(err) => return fail(err, tail),
        }
    }

    debug!(path = %file_name, final_seq = tail.seq, final_hash = %tail.last_hash, "audit chain verified");
    ReplayReport::passed(tail.seq, tail.last_hash)
}

fn fail(err: AuditError, tail: Checkpoint) -> ReplayReport {
    warn!(error = %err, "audit chain verification failed");
    ReplayReport::failed(err, tail.seq, tail.last_hash)
}

/// Validate one record against the accumulator and return the new tail.
fn check_record(
    file: &str,
    line: usize,
    raw: &str,
    tail: &Checkpoint,
    first: bool,
) -> AuditResult<Checkpoint> {
    let malformed = |reason: &str| AuditError::MalformedRecord {
        file: file.to_string(),
        line,
        reason: reason.to_string(),
    };
    let broken = |reason: String| AuditError::ChainMismatch {
        file: file.to_string(),
        line,
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| AuditError::MalformedRecord {
        file: file.to_string(),
        line,
        reason: format!("invalid json ({e})"),
    })?;
    let Value::Object(mut fields) = value else {
        return Err(malformed("event is not object"));
    };
    if !["seq", "prev_hash", canonical::CHAIN_HASH_FIELD]
        .iter()
        .all(|key| fields.contains_key(*key))
    {
        return Err(malformed("missing seq/prev_hash/chain_hash"));
    }

    let seq = fields["seq"]
        .as_u64()
        .filter(|seq| *seq > 0)
        .ok_or_else(|| malformed("invalid seq"))?;
    let (Some(prev_hash), Some(stored)) = (
        string_field(&fields, "prev_hash"),
        string_field(&fields, canonical::CHAIN_HASH_FIELD),
    ) else {
        return Err(malformed("invalid hash fields"));
    };

    if !first {
        let expected = tail
            .seq
            .checked_add(1)
            .ok_or_else(|| malformed("seq overflow (previous record is at u64::MAX)"))?;
        if seq != expected {
            return Err(AuditError::SequenceGap {
                file: file.to_string(),
                line,
                got: seq,
                expected,
            });
        }
    }
    if prev_hash != tail.last_hash {
        return Err(broken(format!(
            "prev_hash mismatch (got {prev_hash}, expected {})",
            tail.last_hash
        )));
    }

    canonical::strip_chain_hash(&mut fields);
    let recomputed = chain_hash(seq, &prev_hash, &canonical::to_canonical_json(&fields)?);
    if recomputed != stored {
        return Err(broken(format!(
            "chain hash mismatch (stored {stored}, computed {recomputed})"
        )));
    }

    Ok(Checkpoint {
        seq,
        last_hash: stored,
    })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Compare the checkpoint at `state_path` with a replayed tail.
///
/// A missing checkpoint only matches an empty chain.  An unreadable or
/// unparsable one never matches.
pub fn verify_state(state_path: &Path, expected_seq: u64, expected_hash: &str) -> AuditResult<()> {
    let mismatch = |found: String| AuditError::CheckpointMismatch {
        found,
        expected_seq,
        expected_hash: expected_hash.to_string(),
    };

    let checkpoint = match FileCheckpointStore::new(state_path).load() {
        Ok(Some(checkpoint)) => checkpoint,
        Ok(None) if expected_seq == 0 && expected_hash == GENESIS_HASH => return Ok(()),
        Ok(None) => {
            return Err(mismatch(format!(
                "state file not found: {}",
                state_path.display()
            )))
        }
        Err(AuditError::MalformedRecord { reason, .. }) => return Err(mismatch(reason)),
        Err(e) => return Err(mismatch(e.to_string())),
    };

    if checkpoint.seq != expected_seq || checkpoint.last_hash != expected_hash {
        let err = mismatch(format!(
            "seq={}, hash={}",
            checkpoint.seq, checkpoint.last_hash
        ));
        warn!(path = %state_path.display(), error = %err, "checkpoint disagrees with log");
        return Err(err);
    }
    Ok(())
}

/// Replay `log_path`, then cross-check its tail against `state_path`.
///
/// A chain failure is reported as-is and the checkpoint is not consulted.
pub fn verify_log(log_path: &Path, state_path: &Path) -> ReplayReport {
    let report = replay(log_path);
    if !report.ok {
        return report;
    }
    match verify_state(state_path, report.final_seq, &report.final_hash) {
        Ok(()) => report,
        Err(err) => ReplayReport::failed(err, report.final_seq, report.final_hash),
    }
}
