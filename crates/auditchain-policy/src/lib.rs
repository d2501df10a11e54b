//! # auditchain-policy
//!
//! Configuration and rotation policy for the auditchain log.
//!
//! ## Overview
//!
//! [`AuditConfig`] is read from TOML (and the `AUDITCHAIN_LOG` /
//! `AUDITCHAIN_STATE` environment variables) and names the active log, its
//! checkpoint, and the rotation thresholds.  [`SizeRotationPolicy`]
//! implements the [`RotationPolicy`](auditchain_core::RotationPolicy)
//! trait from those thresholds.  [`open_writer`] wires everything into a
//! ready `LogWriter`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use auditchain_policy::{open_writer, AuditConfig};
//!
//! let mut config = AuditConfig::from_file(Path::new("/etc/auditchain.toml"))?;
//! config.apply_env_overrides();
//! let mut writer = open_writer(&config)?;
//! ```

pub mod config;
pub mod rotation;

pub use config::{AuditConfig, LogSection, RotationSection, LOG_PATH_ENV, STATE_PATH_ENV};
pub use rotation::SizeRotationPolicy;

use auditchain_contracts::AuditResult;
use auditchain_core::LogWriter;
use auditchain_store::FileCheckpointStore;

/// Open the configured log with a file checkpoint store, installing the
/// rotation policy when any threshold is set.
pub fn open_writer(config: &AuditConfig) -> AuditResult<LogWriter> {
    let store = FileCheckpointStore::new(config.state_path());
    let writer = LogWriter::open(config.log_path(), Box::new(store))?;

    let policy = SizeRotationPolicy::from_section(&config.rotation);
    if policy.is_enabled() {
        Ok(writer.with_rotation_policy(Box::new(policy)))
    } else {
        Ok(writer)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
