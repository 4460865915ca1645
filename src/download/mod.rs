//! Per-file download of recordings with size verification and retries.

mod executor;
mod naming;

pub use executor::{DownloadExecutor, DownloadOutcome, RetryPolicy};
pub use naming::FileNamer;

use serde::{Deserialize, Serialize};

use crate::catalog::Recording;
use crate::error::ZoomError;

/// Recording type of a file the remote side has not finished processing.
pub const INCOMPLETE: &str = "incomplete";

const TIMELINE: &str = "TIMELINE";

/// One file of a recording, ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub file_type: String,
    pub file_extension: String,
    pub download_url: String,
    pub recording_type: String,
    pub file_id: String,
    pub expected_size: u64,
}

impl DownloadTask {
    pub fn is_incomplete(&self) -> bool {
        self.recording_type == INCOMPLETE
    }
}

/// Expand a recording into its files.
///
/// Fails with [`ZoomError::NoFiles`] when the recording carries no file list.
pub fn expand_files(recording: &Recording) -> Result<Vec<DownloadTask>, ZoomError> {
    let files = match recording.recording_files.as_deref() {
        Some(files) if !files.is_empty() => files,
        _ => return Err(ZoomError::NoFiles(recording.uuid.clone())),
    };

    Ok(files
        .iter()
        .map(|file| {
            let recording_type = if file.file_type.is_empty() {
                INCOMPLETE.to_string()
            } else if file.file_type != TIMELINE {
                file.recording_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string())
            } else {
                TIMELINE.to_string()
            };

            DownloadTask {
                file_type: file.file_type.clone(),
                file_extension: file.file_extension.clone(),
                download_url: file.download_url.clone(),
                recording_type,
                file_id: file.id.clone(),
                expected_size: file.file_size,
            }
        })
        .collect())
}
