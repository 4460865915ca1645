use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{FileOutcome, RecordingOutcome};
use crate::download::DownloadOutcome;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub destination: PathBuf,
    pub users: usize,
    pub recordings_completed: usize,
    pub recordings_already_completed: usize,
    pub recordings_failed: usize,
    pub recordings_skipped: usize,
    pub files_downloaded: usize,
    pub files_already_present: usize,
    pub files_failed: usize,
    pub files_incomplete: usize,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn new(destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: &RecordingOutcome) {
        match outcome {
            RecordingOutcome::Completed => self.recordings_completed += 1,
            RecordingOutcome::AlreadyCompleted => self.recordings_already_completed += 1,
            RecordingOutcome::Failed => self.recordings_failed += 1,
            RecordingOutcome::Skipped => self.recordings_skipped += 1,
            RecordingOutcome::Cancelled => self.interrupted = true,
        }
    }

    pub(crate) fn record_file(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Incomplete => self.files_incomplete += 1,
            FileOutcome::Transfer(DownloadOutcome::Downloaded { .. }) => self.files_downloaded += 1,
            FileOutcome::Transfer(DownloadOutcome::AlreadyPresent) => {
                self.files_already_present += 1
            }
            FileOutcome::Transfer(DownloadOutcome::Failed { .. }) => self.files_failed += 1,
            FileOutcome::Transfer(DownloadOutcome::Cancelled) => self.interrupted = true,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.recordings_failed > 0 || self.files_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_follow_outcomes() {
        let mut summary = RunSummary::new(Path::new("/srv/zoom"));
        summary.record(&RecordingOutcome::Completed);
        summary.record(&RecordingOutcome::Failed);
        summary.record(&RecordingOutcome::Skipped);
        summary.record_file(&FileOutcome::Incomplete);
        summary.record_file(&FileOutcome::Transfer(DownloadOutcome::AlreadyPresent));

        assert_eq!(summary.recordings_completed, 1);
        assert_eq!(summary.recordings_failed, 1);
        assert_eq!(summary.recordings_skipped, 1);
        assert_eq!(summary.files_incomplete, 1);
        assert_eq!(summary.files_already_present, 1);
        assert!(summary.has_failures());
        assert!(!summary.interrupted);
    }

    #[test]
    fn test_skipped_recordings_are_not_failures() {
        let mut summary = RunSummary::new(Path::new("/srv/zoom"));
        summary.record(&RecordingOutcome::Skipped);
        summary.record_file(&FileOutcome::Transfer(DownloadOutcome::AlreadyPresent));
        assert!(!summary.has_failures());

        summary.record_file(&FileOutcome::Transfer(DownloadOutcome::Failed {
            attempts: 3,
            reason: "timeout".into(),
        }));
        assert!(summary.has_failures());
    }
}
