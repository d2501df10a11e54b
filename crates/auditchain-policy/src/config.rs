//! Audit log configuration.
//!
//! `AuditConfig` is deserialized from TOML.  Every section is optional:
//!
//! ```toml
//! [log]
//! path = "/var/log/auditchain/audit.jsonl"
//! state_path = "/var/lib/auditchain/audit.jsonl.state"   # default: "<path>.state"
//!
//! [rotation]
//! max_bytes = 10485760
//! max_records = 100000
//! ```
//!
//! `AUDITCHAIN_LOG` and `AUDITCHAIN_STATE` override the log and state paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use auditchain_contracts::{AuditError, AuditResult};
use auditchain_store::state_path_for;

/// Environment variable overriding `log.path`.
pub const LOG_PATH_ENV: &str = "AUDITCHAIN_LOG";

/// Environment variable overriding `log.state_path`.
pub const STATE_PATH_ENV: &str = "AUDITCHAIN_STATE";

/// Log location used when neither the config file nor the environment
/// names one.
pub const DEFAULT_LOG_PATH: &str = "/var/log/auditchain/audit.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,

    /// Checkpoint file.  `None` means `<path>.state`.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            state_path: None,
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

/// Thresholds for rotating the active file.  Unset limits never fire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSection {
    #[serde(default)]
    pub max_bytes: Option<u64>,

    #[serde(default)]
    pub max_records: Option<u64>,
}

/// The top-level structure deserialized from a TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub rotation: RotationSection,
}

impl AuditConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `AuditError::Config` if the TOML is malformed or does not
    /// match the `AuditConfig` schema.
    pub fn from_toml_str(s: &str) -> AuditResult<Self> {
        toml::from_str(s).map_err(|e| AuditError::Config {
            reason: format!("failed to parse audit config TOML: {e}"),
        })
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> AuditResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AuditError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), log = %config.log.path.display(), "audit config loaded");
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply `AUDITCHAIN_LOG` / `AUDITCHAIN_STATE` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`.  Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(LOG_PATH_ENV).filter(|v| !v.is_empty()) {
            self.log.path = PathBuf::from(path);
        }
        if let Some(path) = lookup(STATE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.log.state_path = Some(PathBuf::from(path));
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log.path
    }

    /// The configured checkpoint path, or `<log path>.state`.
    pub fn state_path(&self) -> PathBuf {
        self.log
            .state_path
            .clone()
            .unwrap_or_else(|| state_path_for(&self.log.path))
    }
}
