//! Error types for volcanology-core

use thiserror::Error;

/// Errors produced by the aggregation engine and its collaborators.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The job feed was unreachable or returned something unreadable.
    /// The cycle is abandoned without touching scan state.
    #[error("job feed fetch failed: {0}")]
    Fetch(String),

    /// A raw status code had no entry in the code map.
    #[error("unmapped status code: {code}")]
    UnmappedCode { code: String },

    /// Invalid or inconsistent configuration. Only raised at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An indicator device rejected or failed a command.
    #[error("device {device} failed: {reason}")]
    Device { device: String, reason: String },
}

impl ScanError {
    /// Whether this error only aborts the current cycle.
    pub fn is_cycle_local(&self) -> bool {
        matches!(self, ScanError::Fetch(_) | ScanError::Device { .. })
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ScanError>;
