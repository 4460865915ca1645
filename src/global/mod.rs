use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "zoomdl";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Unable to determine config directory")
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join(APP_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".local").join("share").join(APP_DIR));
    }
    Err(anyhow!("Unable to determine data directory"))
}

pub fn ledger_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("completed-downloads.log"))
}

pub fn issue_log_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("downloads-with-issues.txt"))
}

pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zoom-recordings")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
