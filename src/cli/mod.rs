use crate::app;
use crate::config::Config;
use crate::ledger::CompletionLedger;
use crate::orchestrator::RunSummary;
use anyhow::Result;
use std::path::Path;

pub mod args;

pub use args::{Cli, CliCommand, DownloadCliArgs, LedgerCliArgs};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

pub async fn handle_download_command(
    config_path: Option<&Path>,
    args: DownloadCliArgs,
) -> Result<()> {
    let config = load_config(config_path)?;
    let summary = app::run_download(config, args).await?;
    print_summary(&summary);
    Ok(())
}

pub async fn handle_users_command(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let users = app::list_users(&config).await?;

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!("Found {} user(s):\n", users.len());
    for user in users {
        println!("{}  ({})", user.label(), user.id);
    }
    Ok(())
}

pub fn handle_ledger_command(config_path: Option<&Path>, args: LedgerCliArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let path = config.download.ledger_path()?;
    let ledger = CompletionLedger::load(&path)?;

    if let Some(meeting_id) = args.check {
        if ledger.contains(&meeting_id) {
            println!("{meeting_id}: complete");
        } else {
            println!("{meeting_id}: not recorded");
        }
        return Ok(());
    }

    println!("Ledger: {}", path.display());
    println!("Completed meetings: {}", ledger.len());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.interrupted {
        println!("\nInterrupted. Run again to resume where this run stopped.");
    } else {
        println!("\n*** All done! ***");
    }

    println!(
        "Recordings: {} completed, {} already in ledger, {} failed, {} without files",
        summary.recordings_completed,
        summary.recordings_already_completed,
        summary.recordings_failed,
        summary.recordings_skipped
    );
    println!(
        "Files: {} downloaded, {} already present, {} failed, {} incomplete",
        summary.files_downloaded,
        summary.files_already_present,
        summary.files_failed,
        summary.files_incomplete
    );

    if summary.has_failures() {
        println!("Some recordings did not complete. Run again to retry them.");
    }

    let save_location = std::fs::canonicalize(&summary.destination)
        .unwrap_or_else(|_| summary.destination.clone());
    println!(
        "\nRecordings have been saved to: {}\n",
        save_location.display()
    );
}
