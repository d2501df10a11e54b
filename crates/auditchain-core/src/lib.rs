//! # auditchain-core
//!
//! The hash chain and the writer that extends it.
//!
//! This crate provides:
//! - `chain`:     the FNV-1a 64-bit chain hash
//! - `canonical`: the byte-exact record serialization the hash covers
//! - `traits`:    the `CheckpointStore` and `RotationPolicy` seams
//! - `LogWriter`: durable, append-only JSONL writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auditchain_core::LogWriter;
//! use auditchain_store::FileCheckpointStore;
//!
//! let store = FileCheckpointStore::for_log_path("/var/log/auditchain/audit.jsonl");
//! let mut writer = LogWriter::open("/var/log/auditchain/audit.jsonl", Box::new(store))?;
//! writer.append(&outcome.into_event(ts))?;
//! ```

pub mod canonical;
pub mod chain;
pub mod outcome;
pub mod traits;
pub mod writer;

pub use chain::{chain_hash, fnv1a64};
pub use traits::{CheckpointStore, LogStats, RotationPolicy};
pub use writer::{archive_path_for, LogWriter};
