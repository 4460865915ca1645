//! Resumable downloader for Zoom cloud recordings.
//!
//! A run acquires an OAuth token, enumerates users and their recordings in
//! 30-day windows, downloads every finished file with size verification and
//! retries, and appends each fully downloaded meeting to a completion ledger.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod global;
pub mod ledger;
pub mod network;
pub mod orchestrator;

pub use error::{DownloadError, ZoomError};
