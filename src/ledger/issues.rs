use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::join_error;
use crate::error::ZoomError;

/// Append-only audit trail of downloads that never verified.
pub struct IssueLog {
    path: PathBuf,
    writer: tokio::sync::Mutex<()>,
}

impl IssueLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, filename: &str) -> Result<(), ZoomError> {
        let _guard = self.writer.lock().await;

        let path = self.path.clone();
        let line = format!("Download size mismatch: {filename}\n");
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(line.as_bytes())?;
            file.flush()
        })
        .await
        .map_err(join_error)??;

        warn!("Logged download issue for {} to {:?}", filename, self.path);
        Ok(())
    }
}
