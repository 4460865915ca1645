//! Enumeration of account users and their cloud recordings.
//!
//! The recordings endpoint only accepts ranges of up to 30 days, so a date
//! range is split into consecutive windows queried in ascending order.

mod models;

pub use models::{Recording, RecordingFile, User};

use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::TokenManager;
use crate::error::ZoomError;
use models::{RecordingsPage, UsersPage};

/// Split `[from, to)` into consecutive windows of at most `days` days.
pub fn date_windows(from: NaiveDate, to: NaiveDate, days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let step = ChronoDuration::days(i64::from(days.max(1)));
    let mut windows = Vec::new();
    let mut start = from;
    while start < to {
        let end = (start + step).min(to);
        windows.push((start, end));
        start += step;
    }
    windows
}

/// Case-insensitive substring match; an empty filter keeps everything.
pub fn matches_title(topic: &str, title_filter: &str) -> bool {
    title_filter.is_empty() || topic.to_lowercase().contains(&title_filter.to_lowercase())
}

pub struct RecordingCatalog {
    client: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    page_size: u32,
    window_days: u32,
}

impl RecordingCatalog {
    pub fn new(
        client: Client,
        base_url: &str,
        tokens: Arc<TokenManager>,
        page_size: u32,
        window_days: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            page_size,
            window_days,
        }
    }

    /// All users of the account. Any failed directory page is fatal.
    pub async fn list_users(&self) -> Result<Vec<User>, ZoomError> {
        let url = format!("{}/users", self.base_url);
        let first: UsersPage = self.fetch_users_page(&url, None).await?;
        debug!("User directory has {} pages", first.page_count);

        let mut users = Vec::new();
        for page in 1..=first.page_count {
            let data = self.fetch_users_page(&url, Some(page)).await?;
            users.extend(data.users);
        }

        info!("Found {} users", users.len());
        Ok(users)
    }

    async fn fetch_users_page(&self, url: &str, page: Option<u32>) -> Result<UsersPage, ZoomError> {
        let token = self.tokens.ensure_valid().await?;
        let mut request = self.client.get(url).bearer_auth(token);
        if let Some(page) = page {
            request = request.query(&[("page_number", page)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ZoomError::Directory {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Recordings of `user` (email or id) started within `[from, to)`.
    ///
    /// Windows that fail or carry no `meetings` are logged and skipped.
    pub async fn list_recordings(
        &self,
        user: &str,
        from: NaiveDate,
        to: NaiveDate,
        title_filter: &str,
    ) -> Result<Vec<Recording>, ZoomError> {
        let url = self.recordings_url(user)?;
        let mut recordings = Vec::new();

        for (start, end) in date_windows(from, to, self.window_days) {
            let mut next_page_token: Option<String> = None;
            loop {
                let page = match self
                    .fetch_recordings_page(&url, user, start, end, next_page_token.as_deref())
                    .await
                {
                    Ok(page) => page,
                    Err(err @ ZoomError::Auth(_)) => return Err(err),
                    Err(err) => {
                        warn!(
                            "Failed to list recordings for {} from {} to {}: {}",
                            user, start, end, err
                        );
                        break;
                    }
                };

                match page.meetings {
                    Some(meetings) => {
                        recordings.extend(
                            meetings
                                .into_iter()
                                .filter(|meeting| matches_title(&meeting.topic, title_filter)),
                        );
                    }
                    None => {
                        info!("No meetings found for user {} from {} to {}.", user, start, end);
                        if let Some(message) = page.message {
                            warn!("Error: {}", message);
                        }
                    }
                }

                match page.next_page_token.filter(|token| !token.is_empty()) {
                    Some(token) => next_page_token = Some(token),
                    None => break,
                }
            }
        }

        Ok(recordings)
    }

    /// `{base}/users/{user}/recordings`, with `user` encoded as one path segment.
    fn recordings_url(&self, user: &str) -> Result<Url, ZoomError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ZoomError::Config(format!("invalid base_url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ZoomError::Config(format!("base_url {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["users", user, "recordings"]);
        Ok(url)
    }

    async fn fetch_recordings_page(
        &self,
        url: &Url,
        user: &str,
        start: NaiveDate,
        end: NaiveDate,
        next_page_token: Option<&str>,
    ) -> Result<RecordingsPage, ZoomError> {
        let token = self.tokens.ensure_valid().await?;
        let mut query = vec![
            ("userId", user.to_string()),
            ("page_size", self.page_size.to_string()),
            ("from", start.format("%Y-%m-%d").to_string()),
            ("to", end.format("%Y-%m-%d").to_string()),
        ];
        if let Some(page_token) = next_page_token {
            query.push(("next_page_token", page_token.to_string()));
        }

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
