//! Drives a download run: users → recordings → files → ledger.
//!
//! Only token, directory and startup network failures abort a run. Anything
//! that goes wrong with a single recording or file is logged and the run
//! moves on.

mod summary;

pub use summary::RunSummary;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth::TokenManager;
use crate::catalog::{Recording, RecordingCatalog};
use crate::config::LedgerPolicy;
use crate::download::{expand_files, DownloadExecutor, DownloadOutcome, DownloadTask, FileNamer};
use crate::error::ZoomError;
use crate::ledger::{CompletionLedger, IssueLog};
use crate::network::authorize_url;

/// Whose recordings to fetch.
#[derive(Debug, Clone)]
pub enum Target {
    User { email: String, title_filter: String },
    AllUsers { title_filter: String },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub destination: PathBuf,
    pub concurrency: usize,
    pub ledger_policy: LedgerPolicy,
    pub skip_completed: bool,
    pub organize_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Not yet processed remotely; never downloaded.
    Incomplete,
    Transfer(DownloadOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingOutcome {
    /// Added to the ledger.
    Completed,
    /// Already in the ledger and skipped without touching its files.
    AlreadyCompleted,
    /// Some file was incomplete or failed; not added to the ledger.
    Failed,
    /// No file list at all.
    Skipped,
    Cancelled,
}

/// Whether a recording's file outcomes allow adding it to the ledger.
///
/// An incomplete file always blocks the entry, whatever the policy.
pub fn ledger_eligible(policy: LedgerPolicy, outcomes: &[FileOutcome]) -> bool {
    let mut transfers = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            FileOutcome::Incomplete => return false,
            FileOutcome::Transfer(transfer) => transfers.push(transfer),
        }
    }

    match policy {
        LedgerPolicy::AllFiles => {
            !transfers.is_empty() && transfers.iter().all(|t| t.is_success())
        }
        LedgerPolicy::AnyFile => transfers.iter().any(|t| t.is_success()),
    }
}

pub struct Orchestrator {
    tokens: Arc<TokenManager>,
    catalog: RecordingCatalog,
    executor: DownloadExecutor,
    ledger: CompletionLedger,
    issues: IssueLog,
    namer: FileNamer,
    options: RunOptions,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        tokens: Arc<TokenManager>,
        catalog: RecordingCatalog,
        executor: DownloadExecutor,
        ledger: CompletionLedger,
        issues: IssueLog,
        namer: FileNamer,
        options: RunOptions,
    ) -> Self {
        Self {
            tokens,
            catalog,
            executor,
            ledger,
            issues,
            namer,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub async fn run(&self, target: &Target) -> Result<RunSummary, ZoomError> {
        let mut summary = RunSummary::new(&self.options.destination);
        let (from, to) = (self.options.from, self.options.to);

        match target {
            Target::User {
                email,
                title_filter,
            } => {
                info!(
                    "Getting recording list for {} with title containing: '{}'",
                    email, title_filter
                );
                let recordings = self
                    .catalog
                    .list_recordings(email, from, to, title_filter)
                    .await?;
                summary.users += 1;
                self.process_recordings(email, &recordings, &mut summary)
                    .await?;
            }
            Target::AllUsers { title_filter } => {
                info!("Getting user accounts...");
                let users = self.catalog.list_users().await?;
                for user in users {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    info!("Getting recording list for {}", user.label());
                    let recordings = self
                        .catalog
                        .list_recordings(&user.id, from, to, title_filter)
                        .await?;
                    summary.users += 1;
                    self.process_recordings(&user.email, &recordings, &mut summary)
                        .await?;
                }
            }
        }

        summary.interrupted = self.cancel.is_cancelled();
        Ok(summary)
    }

    /// Download every recording of one user, in listing order.
    pub async fn process_recordings(
        &self,
        email: &str,
        recordings: &[Recording],
        summary: &mut RunSummary,
    ) -> Result<(), ZoomError> {
        let total = recordings.len();
        info!("==> Found {} recordings for {}", total, email);

        let directory = self.destination_for(email);
        for (index, recording) in recordings.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Shutdown requested, stopping before recording {}", recording.uuid);
                break;
            }
            let position = format!("{} of {}", index + 1, total);
            let outcome = self
                .process_recording(&position, recording, &directory, summary)
                .await?;
            summary.record(&outcome);
        }
        Ok(())
    }

    async fn process_recording(
        &self,
        position: &str,
        recording: &Recording,
        directory: &Path,
        summary: &mut RunSummary,
    ) -> Result<RecordingOutcome, ZoomError> {
        self.tokens.ensure_valid().await?;

        if self.ledger.contains(&recording.uuid) {
            if self.options.skip_completed {
                info!("==> Skipping already downloaded meeting: {}", recording.uuid);
                return Ok(RecordingOutcome::AlreadyCompleted);
            }
            debug!("Meeting {} is in the ledger, re-verifying files", recording.uuid);
        }

        let tasks = match expand_files(recording) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(
                    "### Recording files missing for call with id '{}': {}",
                    recording.id, err
                );
                return Ok(RecordingOutcome::Skipped);
            }
        };

        let results: Vec<Result<FileOutcome, ZoomError>> = stream::iter(tasks.iter())
            .map(|task| self.process_file(position, recording, task, directory))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            let outcome = result?;
            summary.record_file(&outcome);
            outcomes.push(outcome);
        }

        if outcomes
            .iter()
            .any(|o| matches!(o, FileOutcome::Transfer(DownloadOutcome::Cancelled)))
        {
            return Ok(RecordingOutcome::Cancelled);
        }

        if !ledger_eligible(self.options.ledger_policy, &outcomes) {
            warn!(
                "Meeting {} ({}) is not complete, leaving it out of the ledger",
                recording.uuid,
                self.namer.meeting_label(recording)
            );
            return Ok(RecordingOutcome::Failed);
        }

        if let Err(err) = self.ledger.record_complete(&recording.uuid).await {
            error!("Failed to record meeting {} as complete: {}", recording.uuid, err);
            return Ok(RecordingOutcome::Failed);
        }
        Ok(RecordingOutcome::Completed)
    }

    async fn process_file(
        &self,
        position: &str,
        recording: &Recording,
        task: &DownloadTask,
        directory: &Path,
    ) -> Result<FileOutcome, ZoomError> {
        if task.is_incomplete() {
            error!(
                "### Incomplete Recording ({}) for recording with id '{}'",
                position, task.file_id
            );
            return Ok(FileOutcome::Incomplete);
        }
        if self.cancel.is_cancelled() {
            return Ok(FileOutcome::Transfer(DownloadOutcome::Cancelled));
        }

        let filename = self.namer.file_name(recording, task);
        info!("==> Downloading ({}) as {}", position, filename);

        let token = self.tokens.ensure_valid().await?;
        let url = authorize_url(&task.download_url, &token);
        let outcome = self
            .executor
            .download(
                &url,
                &directory.join(&filename),
                task.expected_size,
                &self.cancel,
            )
            .await;

        if let DownloadOutcome::Failed { reason, .. } = &outcome {
            debug!("Last failure for {}: {}", filename, reason);
            if let Err(err) = self.issues.record(&filename).await {
                warn!("Failed to write issue log {:?}: {}", self.issues.path(), err);
            }
        }
        Ok(FileOutcome::Transfer(outcome))
    }

    fn destination_for(&self, email: &str) -> PathBuf {
        if self.options.organize_by_user {
            self.options.destination.join(self.namer.sanitize(email))
        } else {
            self.options.destination.clone()
        }
    }
}
