use crate::global;
use anyhow::{bail, Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// The recordings endpoint rejects ranges longer than this.
pub const MAX_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub oauth: OAuthConfig,
    pub api: ApiConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub oauth_url: String,
    /// Probed once at startup to detect a missing network.
    pub reachability_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerPolicy {
    /// Every downloadable file of a meeting must succeed.
    #[default]
    AllFiles,
    /// One successful file is enough (legacy behaviour).
    AnyFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub directory: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page_size: u32,
    pub window_days: u32,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub chunk_size: usize,
    pub concurrency: usize,
    pub ledger_policy: LedgerPolicy,
    /// Skip meetings already present in the ledger instead of re-verifying them.
    pub skip_completed: bool,
    pub organize_by_user: bool,
    pub ledger_file: Option<String>,
    pub issue_log_file: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.zoom.us/v2".to_string(),
            oauth_url: "https://zoom.us/oauth/token".to_string(),
            reachability_url: "https://zoom.us".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: global::default_download_dir().to_string_lossy().into_owned(),
            from: None,
            to: None,
            page_size: 300,
            window_days: MAX_WINDOW_DAYS,
            max_attempts: 3,
            retry_delay_secs: 5,
            connect_timeout_secs: 5,
            read_timeout_secs: 60,
            chunk_size: 32 * 1024,
            concurrency: 1,
            ledger_policy: LedgerPolicy::AllFiles,
            skip_completed: false,
            organize_by_user: false,
            ledger_file: None,
            issue_log_file: None,
        }
    }
}

impl DownloadConfig {
    pub fn directory_path(&self) -> PathBuf {
        global::expand_tilde(&self.directory)
    }

    /// Resolved `[from, to)` range. Defaults to the last 30 days.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let to = self.to.unwrap_or_else(|| Utc::now().date_naive());
        let from = self
            .from
            .unwrap_or_else(|| to - ChronoDuration::days(MAX_WINDOW_DAYS as i64));
        if from > to {
            bail!("Invalid date range: from {} is after to {}", from, to);
        }
        Ok((from, to))
    }

    pub fn window_days(&self) -> u32 {
        self.window_days.clamp(1, MAX_WINDOW_DAYS)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn ledger_path(&self) -> Result<PathBuf> {
        match &self.ledger_file {
            Some(path) => Ok(global::expand_tilde(path)),
            None => global::ledger_file(),
        }
    }

    pub fn issue_log_path(&self) -> Result<PathBuf> {
        match &self.issue_log_file {
            Some(path) => Ok(global::expand_tilde(path)),
            None => global::issue_log_file(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, writing a default file first if none exists.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, creating default at {:?}", path);
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config.with_env_overrides());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config.with_env_overrides())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("ZOOMDL_ACCOUNT_ID") {
            self.oauth.account_id = value;
        }
        if let Ok(value) = std::env::var("ZOOMDL_CLIENT_ID") {
            self.oauth.client_id = value;
        }
        if let Ok(value) = std::env::var("ZOOMDL_CLIENT_SECRET") {
            self.oauth.client_secret = value;
        }
        self
    }

    /// Fails when any OAuth credential is missing.
    pub fn validate_credentials(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("account_id", &self.oauth.account_id),
            ("client_id", &self.oauth.client_id),
            ("client_secret", &self.oauth.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if !missing.is_empty() {
            bail!(
                "Missing OAuth credentials in [oauth]: {}. Set them in the config file or via ZOOMDL_* environment variables.",
                missing.join(", ")
            );
        }
        Ok(())
    }
}
