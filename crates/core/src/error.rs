//! Error types for the synchronization core.

use thiserror::Error;

/// Errors produced by strict-parse and validation paths.
///
/// Interactive edit paths never surface these: malformed hex degrades to
/// black, a busy arbiter makes propagation a silent no-op, and external
/// write failures are logged and counted at the flush boundary instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A configuration value failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_color_includes_message() {
        let err = SyncError::InvalidColor("bad hex".into());
        let msg = format!("{err}");
        assert!(msg.contains("bad hex"), "missing message in: {msg}");
    }

    #[test]
    fn invalid_config_includes_message() {
        let err = SyncError::InvalidConfig("debounce_ms must be non-zero".into());
        let msg = format!("{err}");
        assert!(msg.contains("debounce_ms"), "missing message in: {msg}");
    }

    #[test]
    fn sync_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncError>();
    }

    #[test]
    fn sync_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<SyncError>();
    }
}
