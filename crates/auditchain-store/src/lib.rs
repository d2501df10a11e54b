//! # auditchain-store
//!
//! Checkpoint stores for the auditchain log writer.
//!
//! ## Overview
//!
//! A checkpoint caches the `(seq, chain_hash)` of the last appended record
//! so a restarted writer need not replay its log, and so the verifier has a
//! second witness to cross-check the log's tail against.
//!
//! - [`FileCheckpointStore`]: one JSON file, replaced atomically
//! - [`InMemoryCheckpointStore`]: shared in-process value
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auditchain_core::{CheckpointStore, LogWriter};
//! use auditchain_store::FileCheckpointStore;
//!
//! let store = FileCheckpointStore::for_log_path(&log_path);
//! let mut writer = LogWriter::open(&log_path, Box::new(store))?;
//! ```

pub mod file;
pub mod memory;

pub use file::{state_path_for, FileCheckpointStore};
pub use memory::InMemoryCheckpointStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
