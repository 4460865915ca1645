use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DownloadError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A file of the expected size was already on disk; nothing was fetched.
    AlreadyPresent,
    Downloaded { bytes: u64, attempts: u32 },
    Failed { attempts: u32, reason: String },
    /// Shutdown was requested before the file could be verified.
    Cancelled,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DownloadOutcome::AlreadyPresent | DownloadOutcome::Downloaded { .. }
        )
    }
}

pub struct DownloadExecutor {
    client: Client,
    policy: RetryPolicy,
    read_timeout: Duration,
    chunk_size: usize,
    show_progress: bool,
    // Concurrent downloads stack their bars here instead of overdrawing each other.
    bars: MultiProgress,
}

impl DownloadExecutor {
    /// `client` should carry the connect timeout; `read_timeout` bounds the
    /// wait for each chunk of the body.
    pub fn new(client: Client, policy: RetryPolicy, read_timeout: Duration, chunk_size: usize) -> Self {
        Self {
            client,
            policy,
            read_timeout,
            chunk_size: chunk_size.max(1024),
            show_progress: false,
            bars: MultiProgress::new(),
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fetch `url` into `destination` until its size equals `expected_size`.
    ///
    /// Never returns an error: failures are reported through the outcome so
    /// the caller can move on to the next file.
    pub async fn download(
        &self,
        url: &str,
        destination: &Path,
        expected_size: u64,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let file_label = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| destination.display().to_string());

        match fs::metadata(destination).await {
            Ok(meta) if meta.len() == expected_size => {
                info!("File already downloaded and verified: {}", file_label);
                return DownloadOutcome::AlreadyPresent;
            }
            Ok(meta) => {
                warn!(
                    "File exists but size mismatch (expected: {}, found: {}). Redownloading...",
                    expected_size,
                    meta.len()
                );
                if let Err(err) = fs::remove_file(destination).await {
                    return DownloadOutcome::Failed {
                        attempts: 0,
                        reason: format!("could not remove stale file: {err}"),
                    };
                }
            }
            Err(_) => info!("File not found, downloading: {}", file_label),
        }

        if let Some(parent) = destination.parent() {
            if let Err(err) = fs::create_dir_all(parent).await {
                return DownloadOutcome::Failed {
                    attempts: 0,
                    reason: format!("could not create {}: {err}", parent.display()),
                };
            }
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return DownloadOutcome::Cancelled;
            }

            match self.attempt(url, destination, expected_size).await {
                Ok(bytes) => {
                    info!("Download successful: {}", file_label);
                    return DownloadOutcome::Downloaded {
                        bytes,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, file_label, err);
                    last_error = err.to_string();
                }
            }

            if attempt < max_attempts {
                info!("Retrying download ({}/{})...", attempt + 1, max_attempts);
                tokio::select! {
                    _ = cancel.cancelled() => return DownloadOutcome::Cancelled,
                    _ = sleep(self.policy.delay) => {}
                }
            }
        }

        error!("Failed to download {} after {} attempts.", file_label, max_attempts);
        DownloadOutcome::Failed {
            attempts: max_attempts,
            reason: last_error,
        }
    }

    async fn attempt(
        &self,
        url: &str,
        destination: &Path,
        expected_size: u64,
    ) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let progress = self.progress_bar(response.content_length().unwrap_or(0));

        let written = self.write_body(response, destination, &progress).await;
        progress.finish_and_clear();
        self.bars.remove(&progress);
        written?;

        let actual = fs::metadata(destination).await?.len();
        debug!("Wrote {} bytes to {}", actual, destination.display());
        if actual != expected_size {
            return Err(DownloadError::SizeMismatch {
                expected: expected_size,
                actual,
            });
        }
        Ok(actual)
    }

    async fn write_body(
        &self,
        response: reqwest::Response,
        destination: &Path,
        progress: &ProgressBar,
    ) -> Result<(), DownloadError> {
        let file = fs::File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = timeout(self.read_timeout, stream.next())
            .await
            .map_err(|_| DownloadError::ReadTimeout(self.read_timeout))?
        {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            progress.inc(chunk.len() as u64);
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(())
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = self.bars.add(ProgressBar::new(total));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
        {
            pb.set_style(style.progress_chars("━╸━"));
        }
        pb
    }
}
