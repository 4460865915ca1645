use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::catalog::Recording;
use crate::download::DownloadTask;

/// Longest file name most filesystems accept, in bytes.
const MAX_FILENAME_BYTES: usize = 255;

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Builds local file names for recording files.
pub struct FileNamer {
    invalid_chars: Regex,
}

impl FileNamer {
    pub fn new() -> Result<Self> {
        let invalid_chars = Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#)?;
        Ok(Self { invalid_chars })
    }

    /// `{topic} - {YYYY.MM.DD - hh.mm AM UTC} - {Recording Type} - {file id}.{ext}`
    pub fn file_name(&self, recording: &Recording, task: &DownloadTask) -> String {
        let topic = self.strip_invalid(&recording.topic);
        let meeting_time = format_start_time(&recording.start_time)
            .unwrap_or_else(|| self.strip_invalid(&recording.start_time));
        let rec_type = title_case(&task.recording_type.replace('_', " "));
        let extension = if task.file_extension.is_empty() {
            task.file_type.to_lowercase()
        } else {
            task.file_extension.to_lowercase()
        };

        let name = format!(
            "{} - {} - {} - {}.{}",
            topic, meeting_time, rec_type, task.file_id, extension
        );
        self.sanitize(&name)
    }

    /// `{topic} - {time}`, used as a per-meeting label in logs.
    pub fn meeting_label(&self, recording: &Recording) -> String {
        let topic = self.strip_invalid(&recording.topic);
        match format_start_time(&recording.start_time) {
            Some(time) => format!("{topic} - {time}"),
            None => topic,
        }
    }

    fn strip_invalid(&self, value: &str) -> String {
        self.invalid_chars.replace_all(value, "").into_owned()
    }

    /// Make `name` legal as a single path component.
    pub fn sanitize(&self, name: &str) -> String {
        let stripped = self.strip_invalid(name);
        let mut cleaned = stripped.trim().trim_end_matches(['.', ' ']).to_string();

        if cleaned.len() > MAX_FILENAME_BYTES {
            let mut cut = MAX_FILENAME_BYTES;
            while !cleaned.is_char_boundary(cut) {
                cut -= 1;
            }
            cleaned.truncate(cut);
            cleaned = cleaned.trim_end_matches(['.', ' ']).to_string();
        }

        let stem = cleaned.split('.').next().unwrap_or_default();
        if RESERVED_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(stem.trim()))
        {
            cleaned.insert(0, '_');
        }

        if cleaned.is_empty() {
            "untitled".to_string()
        } else {
            cleaned
        }
    }
}

fn format_start_time(start_time: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(start_time).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .format("%Y.%m.%d - %I.%M %p UTC")
            .to_string(),
    )
}

/// Upper-case the first letter of every word and lower-case the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for ch in value.chars() {
        if prev_is_letter {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_is_letter = ch.is_alphabetic();
    }
    out
}
