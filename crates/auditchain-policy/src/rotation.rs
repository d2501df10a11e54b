//! Threshold-based rotation policy.
//!
//! Rotation fires when the active file has reached either configured limit.
//! An unset limit never fires, so the default policy never rotates.

use tracing::debug;

use auditchain_core::{LogStats, RotationPolicy};

use crate::config::RotationSection;

/// A `RotationPolicy` driven by the `[rotation]` config section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeRotationPolicy {
    max_bytes: Option<u64>,
    max_records: Option<u64>,
}

impl SizeRotationPolicy {
    pub fn new(max_bytes: Option<u64>, max_records: Option<u64>) -> Self {
        Self {
            max_bytes,
            max_records,
        }
    }

    pub fn from_section(section: &RotationSection) -> Self {
        Self::new(section.max_bytes, section.max_records)
    }

    /// True when at least one limit is configured.
    pub fn is_enabled(&self) -> bool {
        self.max_bytes.is_some() || self.max_records.is_some()
    }
}

impl RotationPolicy for SizeRotationPolicy {
    fn should_rotate(&self, stats: &LogStats) -> bool {
        let by_bytes = self.max_bytes.is_some_and(|max| stats.bytes >= max);
        let by_records = self.max_records.is_some_and(|max| stats.records >= max);
        if by_bytes || by_records {
            debug!(
                bytes = stats.bytes,
                records = stats.records,
                by_bytes,
                by_records,
                "rotation threshold reached"
            );
        }
        by_bytes || by_records
    }
}
