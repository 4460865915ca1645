use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zoomdl")]
#[command(about = "Download Zoom cloud recordings to local storage", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Download recordings (default when no command is given)
    Download(DownloadCliArgs),
    /// List the users of the account
    Users,
    /// Inspect the completion ledger
    Ledger(LedgerCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Default)]
pub struct DownloadCliArgs {
    /// Only download recordings of this user (default: all users)
    #[arg(short, long)]
    pub email: Option<String>,
    /// Only keep meetings whose topic contains this text (case-insensitive)
    #[arg(short, long)]
    pub title: Option<String>,
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// End date, exclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Destination directory
    #[arg(short, long)]
    pub dest: Option<PathBuf>,
    /// Files of one recording downloaded at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Hide per-file progress bars
    #[arg(long)]
    pub no_progress: bool,
    /// Skip meetings already recorded in the ledger
    #[arg(long)]
    pub skip_completed: bool,
}

#[derive(ClapArgs, Debug)]
pub struct LedgerCliArgs {
    /// Report whether this meeting uuid is recorded as complete
    #[arg(long)]
    pub check: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_args() {
        let cli = Cli::parse_from([
            "zoomdl",
            "-v",
            "download",
            "--email",
            "ana@example.com",
            "--title",
            "Standup",
            "--from",
            "2025-06-01",
            "--to",
            "2025-06-30",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Some(CliCommand::Download(args)) => {
                assert_eq!(args.email.as_deref(), Some("ana@example.com"));
                assert_eq!(args.title.as_deref(), Some("Standup"));
                assert_eq!(args.from, NaiveDate::from_ymd_opt(2025, 6, 1));
                assert!(!args.no_progress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_command_is_allowed() {
        let cli = Cli::parse_from(["zoomdl", "--config", "/tmp/zoomdl.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/zoomdl.toml")));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["zoomdl", "download", "--from", "June"]).is_err());
    }
}
