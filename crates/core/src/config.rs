//! Tuning constants for the synchronization engine, loadable from JSON.
//!
//! Every field has a default matching the interactive behavior of the
//! reference editor, so a partial (or absent) config is always usable.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration. All thresholds operate on normalized channel
/// values unless noted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Session-start color, hex. Mid-gray by default.
    pub default_color: String,

    /// LAB input components within this distance of zero snap to exactly 0
    /// before conversion (LAB units).
    pub lab_snap_threshold: f64,

    /// LAB changes smaller than this on every channel are treated as
    /// unchanged rather than fanning out (anti-jitter, LAB units).
    pub lab_jitter_epsilon: f64,

    /// Default grouping tolerance for near-equal colors.
    pub group_tolerance: f64,

    /// Delay before a debounced flush commits cached writes.
    pub debounce_ms: u64,

    /// Backoff before retrying a flush that found the arbiter busy.
    pub flush_backoff_ms: u64,

    /// Minimum brush-color movement the external watcher reports.
    pub watcher_epsilon: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_color: "#808080".to_string(),
            lab_snap_threshold: 0.1,
            lab_jitter_epsilon: 1e-4,
            group_tolerance: 1e-3,
            debounce_ms: 100,
            flush_backoff_ms: 50,
            watcher_epsilon: 1e-4,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn flush_backoff(&self) -> Duration {
        Duration::from_millis(self.flush_backoff_ms)
    }

    /// Validates all fields, returning the first problem found.
    pub fn validate(&self) -> Result<(), SyncError> {
        crate::color::Srgb::from_hex(&self.default_color)
            .map_err(|e| SyncError::InvalidConfig(format!("default_color: {e}")))?;
        for (name, value) in [
            ("lab_snap_threshold", self.lab_snap_threshold),
            ("lab_jitter_epsilon", self.lab_jitter_epsilon),
            ("group_tolerance", self.group_tolerance),
            ("watcher_epsilon", self.watcher_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SyncError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.debounce_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "debounce_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
