//! Durable record of meetings whose files were all downloaded and verified.
//!
//! The ledger is a plain text file with one meeting uuid per line. It is only
//! ever appended to; duplicate lines are tolerated and collapse on load.

mod issues;

pub use issues::IssueLog;

use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::task::JoinError;
use tracing::{debug, info};

use crate::error::ZoomError;

pub struct CompletionLedger {
    path: PathBuf,
    completed: Mutex<HashSet<String>>,
    // Serializes appends within this process; fs2 covers other processes.
    writer: tokio::sync::Mutex<()>,
}

impl CompletionLedger {
    /// Read existing entries. A missing file yields an empty ledger.
    pub fn load(path: &Path) -> Result<Self, ZoomError> {
        let mut completed = HashSet::new();
        let mut lines = 0usize;

        match File::open(path) {
            Ok(file) => {
                for line in BufReader::new(file).lines() {
                    let line = line?;
                    let id = line.trim();
                    if id.is_empty() {
                        continue;
                    }
                    lines += 1;
                    completed.insert(id.to_string());
                }
                info!(
                    "Loaded {} completed meetings from {:?}",
                    completed.len(),
                    path
                );
                if lines > completed.len() {
                    debug!("Ledger contains {} duplicate lines", lines - completed.len());
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("Ledger not found, it will be created at {:?}", path);
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self {
            path: path.to_path_buf(),
            completed: Mutex::new(completed),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, meeting_id: &str) -> bool {
        self.lock().contains(meeting_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append `meeting_id` and make it durable before returning.
    ///
    /// Waiting on the file lock and the fsync happen on the blocking pool.
    pub async fn record_complete(&self, meeting_id: &str) -> Result<(), ZoomError> {
        let _writer = self.writer.lock().await;

        let path = self.path.clone();
        let line = format!("{meeting_id}\n");
        tokio::task::spawn_blocking(move || append_durably(&path, line.as_bytes()))
            .await
            .map_err(join_error)??;

        self.lock().insert(meeting_id.to_string());
        debug!("Recorded meeting {} as complete", meeting_id);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.completed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Append `bytes` to `path` under an exclusive advisory lock and sync to disk.
fn append_durably(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    let written = file
        .write_all(bytes)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_data());
    if let Err(err) = FileExt::unlock(&file) {
        debug!("Failed to release lock on {:?}: {err:?}", path);
    }
    written
}

fn join_error(err: JoinError) -> ZoomError {
    ZoomError::Io(std::io::Error::other(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.log");

        let ledger = CompletionLedger::load(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("abc=="));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_record_complete_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("completed.log");

        let ledger = CompletionLedger::load(&path).unwrap();
        ledger.record_complete("abc==").await.unwrap();
        ledger.record_complete("def/+==").await.unwrap();

        assert!(ledger.contains("abc=="));
        assert_eq!(ledger.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "abc==\ndef/+==\n"
        );
    }

    #[test]
    fn test_load_collapses_duplicates_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.log");
        std::fs::write(&path, "abc==\n\nabc==\n  def==  \n").unwrap();

        let ledger = CompletionLedger::load(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("def=="));
    }

    #[tokio::test]
    async fn test_entries_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.log");

        CompletionLedger::load(&path)
            .unwrap()
            .record_complete("abc==")
            .await
            .unwrap();
        let ledger = CompletionLedger::load(&path).unwrap();
        ledger.record_complete("abc==").await.unwrap();

        let reloaded = CompletionLedger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_waiting_on_file_lock_keeps_runtime_responsive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("completed.log");
        let ledger = CompletionLedger::load(&path).unwrap();

        // Another handle, as a second process would have, holds the lock.
        let other = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        other.lock_exclusive().unwrap();
        let holder = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(400));
            FileExt::unlock(&other).unwrap();
        });

        let started = std::time::Instant::now();
        let (recorded, timer_fired_at) = tokio::join!(ledger.record_complete("abc=="), async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            started.elapsed()
        });
        recorded.unwrap();
        holder.join().unwrap();

        assert!(timer_fired_at < std::time::Duration::from_millis(300));
        assert!(started.elapsed() >= std::time::Duration::from_millis(350));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc==\n");
    }
}
