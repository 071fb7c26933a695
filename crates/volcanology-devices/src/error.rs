//! Error types for volcanology-devices

use thiserror::Error;
use volcanology_core::ScanError;

/// Errors that can occur talking to Jenkins or an indicator device
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Socket error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body could not be decoded
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Device did not answer in time
    #[error("timed out after {0} ms")]
    Timeout(u128),

    /// Device answered but refused the command
    #[error("device rejected command: {0}")]
    Rejected(String),

    /// Adapter configuration is unusable
    #[error("invalid device configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        DeviceError::Http(err.to_string())
    }
}

impl DeviceError {
    /// Attribute this error to a named indicator.
    pub fn for_device(self, device: &str) -> ScanError {
        ScanError::Device {
            device: device.to_string(),
            reason: self.to_string(),
        }
    }

    /// Report this error as a failed feed fetch.
    pub fn into_fetch(self) -> ScanError {
        ScanError::Fetch(self.to_string())
    }
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, DeviceError>;
