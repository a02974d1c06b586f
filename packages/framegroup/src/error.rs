//! Error types for the bounds tracking core.
//!
//! The core has no recoverable I/O of its own; every failure originates in a
//! native toolkit call it invokes. Missing lookups (no group, no leader, no
//! window for an id) are benign no-ops and never surface as errors.

use thiserror::Error;

/// Errors surfaced by toolkit collaborators.
#[derive(Debug, Error)]
pub enum FrameGroupError {
    /// A native window call failed (get/set bounds, unmaximize, restore).
    #[error("Toolkit error: {0}")]
    Toolkit(String),
    /// The batched multi-window transaction facility failed.
    #[error("Transaction error: {0}")]
    Transaction(String),
    /// The tracker was used after its listeners were detached.
    #[error("Tracker for window '{0}' is detached")]
    Detached(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FrameGroupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolkit_error_display() {
        let err = FrameGroupError::Toolkit("window vanished".to_string());
        assert!(err.to_string().contains("Toolkit error"));
        assert!(err.to_string().contains("window vanished"));
    }

    #[test]
    fn test_transaction_error_display() {
        let err = FrameGroupError::Transaction("commit failed (error 3)".to_string());
        assert!(err.to_string().contains("Transaction error"));
    }

    #[test]
    fn test_detached_error_display() {
        let err = FrameGroupError::Detached("main-window".to_string());
        assert!(err.to_string().contains("main-window"));
        assert!(err.to_string().contains("detached"));
    }
}
