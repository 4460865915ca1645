//! Error types shared by the download engine.

use std::time::Duration;
use thiserror::Error;

/// Errors that stop an operation. Whether they stop the whole run is up to
/// the caller: auth, directory and network errors are fatal, `NoFiles` only
/// skips one recording.
#[derive(Debug, Error)]
pub enum ZoomError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Could not retrieve users ({status}): {body}")]
    Directory { status: u16, body: String },

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("No recording files found for meeting {0}")]
    NoFiles(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse API response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single download attempt failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data received for {0:?}")]
    ReadTimeout(Duration),

    #[error("size mismatch (expected: {expected}, actual: {actual})")]
    SizeMismatch { expected: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_message() {
        let err = ZoomError::Directory {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "Could not retrieve users (401): unauthorized");
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = DownloadError::SizeMismatch {
            expected: 500,
            actual: 200,
        };
        assert_eq!(err.to_string(), "size mismatch (expected: 500, actual: 200)");
    }
}
