//! Response shapes of the Zoom users and recordings endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// "First Last - email" when both names are known, otherwise the email.
    pub fn label(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {} - {}", self.first_name, self.last_name, self.email)
        } else {
            self.email.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersPage {
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub uuid: String,
    pub id: u64,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub recording_files: Option<Vec<RecordingFile>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub recording_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordingsPage {
    pub meetings: Option<Vec<Recording>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
