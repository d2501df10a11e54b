//! The log writer: appends hash-chained records to a JSONL file.
//!
//! Every append follows the same order:
//!
//!   Checkpoint → Seal (serialize + hash) → Append + fsync → Checkpoint update
//!
//! A record is acknowledged only after its line is on disk.  The checkpoint
//! is written afterwards and may lag the log by one record if that second
//! write fails; the writer always continues from the tail it confirmed in
//! the log, never from an unconfirmed checkpoint.
//!
//! One writer owns one active file.  Nothing here locks across processes.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use auditchain_contracts::{
    AuditError, AuditResult, Checkpoint, Event, Record, RotationAnchor,
};

use crate::{
    canonical,
    traits::{CheckpointStore, LogStats, RotationPolicy},
};

/// Appends records to one active log file and keeps its checkpoint current.
pub struct LogWriter {
    path: PathBuf,
    store: Box<dyn CheckpointStore>,
    policy: Option<Box<dyn RotationPolicy>>,
    /// `(seq, chain_hash)` of the last record confirmed durable in the log.
    tail: Checkpoint,
    stats: LogStats,
}

impl LogWriter {
    /// Open (or create) the log at `path`, reconciling `store` against it.
    ///
    /// The last record of the file is authoritative.  If the checkpoint
    /// disagrees with it, for instance because a previous checkpoint write
    /// failed, the checkpoint is rewritten from the log.  A torn or
    /// malformed final line is an error; history is never repaired.
    pub fn open(path: impl Into<PathBuf>, store: Box<dyn CheckpointStore>) -> AuditResult<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| AuditError::io(dir, &e))?;
        }

        let (tail, stats) = read_tail(&path)?;
        let cached = store.get();
        if cached != tail {
            warn!(
                path = %path.display(),
                checkpoint_seq = cached.seq,
                log_seq = tail.seq,
                "checkpoint disagrees with log tail, rebuilding from log"
            );
            if let Err(e) = store.set(&tail) {
                warn!(path = %path.display(), error = %e, "checkpoint rebuild failed");
            }
        }

        info!(
            path = %path.display(),
            seq = tail.seq,
            last_hash = %tail.last_hash,
            "audit log opened"
        );

        Ok(Self {
            path,
            store,
            policy: None,
            tail,
            stats,
        })
    }

    /// Rotate automatically whenever `policy` fires before an append.
    pub fn with_rotation_policy(mut self, policy: Box<dyn RotationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last record confirmed durable in the active file.
    pub fn tail(&self) -> &Checkpoint {
        &self.tail
    }

    pub fn stats(&self) -> LogStats {
        self.stats
    }

    /// Append `event` as the next record of the active chain.
    ///
    /// If a rotation policy is installed and fires, the active file is first
    /// rotated to [`archive_path_for`]`(path, event.ts())`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the line cannot be written and synced; in that case
    /// neither the log nor the checkpoint advances.  A failed checkpoint
    /// update after a successful write is logged and tolerated.
    pub fn append(&mut self, event: &Event) -> AuditResult<Record> {
        if self.rotation_due() {
            let archive = archive_path_for(&self.path, event.ts());
            self.rotate(&archive, event.ts())?;
        }
        self.commit(event)
    }

    /// Close the active chain and move its file to `archive_path`.
    ///
    /// Appends a `rotation_anchor` naming `archive_path` as the final record
    /// of the outgoing chain, renames the file, hands the archived file its
    /// own checkpoint at the store's sibling location, and starts a fresh
    /// chain at `seq = 1` / `"genesis"`.  Returns the anchor record.
    ///
    /// # Errors
    ///
    /// Fails without touching the log if `archive_path` already exists.  If
    /// the rename fails, the anchor is cut back off the active file and the
    /// tail and checkpoint return to where they were, so the active chain
    /// carries on as if `rotate` had not been called.
    pub fn rotate(&mut self, archive_path: &Path, ts: i64) -> AuditResult<Record> {
        if archive_path.exists() {
            return Err(AuditError::Io {
                path: archive_path.display().to_string(),
                reason: "archive already exists".to_string(),
            });
        }

        let before = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(AuditError::io(&self.path, &e)),
        };
        let (prev_tail, prev_stats) = (self.tail.clone(), self.stats);

        let anchor = RotationAnchor {
            rotated_file: archive_path.display().to_string(),
        }
        .into_event(ts);
        let record = self.commit(&anchor)?;

        if let Err(e) = fs::rename(&self.path, archive_path) {
            self.undo_commit(before, prev_tail, prev_stats);
            return Err(AuditError::io(archive_path, &e));
        }
        sync_parent_dir(&self.path)?;

        let archived = self.store.for_log(archive_path);
        if let Err(e) = archived.set(&self.tail) {
            warn!(archive = %archive_path.display(), error = %e, "archived checkpoint write failed");
        }
        if let Err(e) = self.store.clear() {
            warn!(path = %self.path.display(), error = %e, "active checkpoint reset failed");
        }

        info!(
            path = %self.path.display(),
            archive = %archive_path.display(),
            final_seq = record.seq,
            final_hash = %record.chain_hash,
            "audit log rotated"
        );

        self.tail = Checkpoint::genesis();
        self.stats = LogStats::default();
        Ok(record)
    }

    /// Cut the active file back to `len` bytes and restore the tail that
    /// preceded the last commit.  If the file cannot be cut back, the
    /// committed record stays and so does the tail that points at it.
    fn undo_commit(&mut self, len: u64, tail: Checkpoint, stats: LogStats) {
        let cut = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .and_then(|file| truncate_file(&file, len));
        if let Err(e) = cut {
            warn!(path = %self.path.display(), error = %e, "could not remove rotation anchor");
            return;
        }

        self.tail = tail;
        self.stats = stats;
        if let Err(e) = self.store.set(&self.tail) {
            warn!(path = %self.path.display(), error = %e, "checkpoint restore failed");
        }
        warn!(path = %self.path.display(), seq = self.tail.seq, "rotation rolled back");
    }

    fn rotation_due(&self) -> bool {
        self.tail.seq > 0
            && self
                .policy
                .as_ref()
                .is_some_and(|policy| policy.should_rotate(&self.stats))
    }

    fn commit(&mut self, event: &Event) -> AuditResult<Record> {
        let cached = self.store.get();
        if cached != self.tail {
            warn!(
                checkpoint_seq = cached.seq,
                log_seq = self.tail.seq,
                "checkpoint not confirmed durable, continuing from log tail"
            );
        }

        let seq = self.tail.seq.checked_add(1).ok_or_else(|| AuditError::Io {
            path: self.path.display().to_string(),
            reason: "seq space exhausted (last record is at u64::MAX)".to_string(),
        })?;
        let sealed = canonical::seal(seq, &self.tail.last_hash, event)?;
        let written = append_line(&self.path, &sealed.line)?;

        self.tail = Checkpoint {
            seq,
            last_hash: sealed.record.chain_hash.clone(),
        };
        self.stats.bytes += written;
        self.stats.records = seq;

        if let Err(e) = self.store.set(&self.tail) {
            warn!(seq, error = %e, "checkpoint update failed, log is ahead of checkpoint");
        }

        debug!(
            seq,
            event_type = %event.kind(),
            chain_hash = %sealed.record.chain_hash,
            "audit record appended"
        );

        Ok(sealed.record)
    }
}

/// `<stem>.<ts>.<ext>` next to `active`, with a `-N` suffix if that name is
/// already taken.
pub fn archive_path_for(active: &Path, ts: i64) -> PathBuf {
    let stem = active
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audit".to_string());
    let ext = active.extension().map(|e| e.to_string_lossy().into_owned());

    let mut attempt = 0u32;
    loop {
        let mut name = format!("{stem}.{ts}");
        if attempt > 0 {
            name.push_str(&format!("-{attempt}"));
        }
        if let Some(ext) = &ext {
            name.push('.');
            name.push_str(ext);
        }
        let candidate = active.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

/// Append `line` plus a newline and fsync.  On failure the file is cut back
/// to its previous length so no partial record survives.
fn append_line(path: &Path, line: &str) -> AuditResult<u64> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError::io(path, &e))?;
    let before = file.metadata().map_err(|e| AuditError::io(path, &e))?.len();

    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');

    if let Err(e) = file.write_all(&buf).and_then(|()| file.sync_data()) {
        if let Err(rollback) = truncate_file(&file, before) {
            warn!(path = %path.display(), error = %rollback, "could not roll back partial record");
        }
        return Err(AuditError::io(path, &e));
    }

    if before == 0 {
        sync_parent_dir(path)?;
    }
    Ok(buf.len() as u64)
}

fn truncate_file(file: &File, len: u64) -> std::io::Result<()> {
    file.set_len(len)?;
    file.sync_data()
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> AuditResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let dir = File::open(parent).map_err(|e| AuditError::io(parent, &e))?;
        dir.sync_all().map_err(|e| AuditError::io(parent, &e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> AuditResult<()> {
    Ok(())
}

/// Scan the log and return the `(seq, chain_hash)` of its last record.
///
/// Only the final record is parsed; checking the whole chain is the
/// verifier's job.
fn read_tail(path: &Path) -> AuditResult<(Checkpoint, LogStats)> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok((Checkpoint::genesis(), LogStats::default()));
        }
        Err(e) => return Err(AuditError::io(path, &e)),
    };
    let bytes = file.metadata().map_err(|e| AuditError::io(path, &e))?.len();

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut last: Option<(usize, Vec<u8>, bool)> = None;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| AuditError::io(path, &e))?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let terminated = buf.last() == Some(&b'\n');
        if !buf.iter().all(u8::is_ascii_whitespace) {
            last = Some((line_no, buf.clone(), terminated));
        }
    }

    let Some((line, raw, terminated)) = last else {
        return Ok((Checkpoint::genesis(), LogStats { bytes, records: 0 }));
    };

    let malformed = |reason: String| AuditError::MalformedRecord {
        file: path.display().to_string(),
        line,
        reason,
    };

    if !terminated {
        return Err(malformed("torn final record (no trailing newline)".to_string()));
    }

    let value: Value = serde_json::from_slice(&raw)
        .map_err(|e| malformed(format!("invalid json ({e})")))?;
    let seq = value
        .get("seq")
        .and_then(Value::as_u64)
        .filter(|seq| *seq > 0)
        .ok_or_else(|| malformed("invalid seq".to_string()))?;
    let last_hash = value
        .get(canonical::CHAIN_HASH_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("invalid hash fields".to_string()))?
        .to_string();

    Ok((Checkpoint { seq, last_hash }, LogStats { bytes, records: seq }))
}
