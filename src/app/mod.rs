use crate::auth::TokenManager;
use crate::catalog::{RecordingCatalog, User};
use crate::cli::DownloadCliArgs;
use crate::config::Config;
use crate::download::{DownloadExecutor, FileNamer, RetryPolicy};
use crate::ledger::{CompletionLedger, IssueLog};
use crate::network;
use crate::orchestrator::{Orchestrator, RunOptions, RunSummary, Target};
use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run a full download pass with `args` layered over `config`.
pub async fn run_download(mut config: Config, args: DownloadCliArgs) -> Result<RunSummary> {
    apply_overrides(&mut config, &args);
    config.validate_credentials()?;

    let (client, tokens) = connect(&config).await?;

    let download = &config.download;
    let (from, to) = download.date_range()?;
    let ledger = CompletionLedger::load(&download.ledger_path()?)
        .context("Failed to load completion ledger")?;
    let issues = IssueLog::new(&download.issue_log_path()?);

    let catalog = RecordingCatalog::new(
        client.clone(),
        &config.api.base_url,
        tokens.clone(),
        download.page_size,
        download.window_days(),
    );
    let executor = DownloadExecutor::new(
        client,
        RetryPolicy {
            max_attempts: download.max_attempts,
            delay: download.retry_delay(),
        },
        download.read_timeout(),
        download.chunk_size,
    )
    .with_progress(!args.no_progress);

    let options = RunOptions {
        from,
        to,
        destination: download.directory_path(),
        concurrency: download.concurrency,
        ledger_policy: download.ledger_policy,
        skip_completed: download.skip_completed,
        organize_by_user: download.organize_by_user,
    };
    info!(
        "Downloading recordings from {} to {} into {:?}",
        from, to, options.destination
    );

    let orchestrator = Orchestrator::new(
        tokens,
        catalog,
        executor,
        ledger,
        issues,
        FileNamer::new()?,
        options,
    )
    .with_cancellation(install_shutdown_handler());

    let title_filter = args.title.unwrap_or_default();
    let target = match args.email.filter(|email| !email.trim().is_empty()) {
        Some(email) => Target::User {
            email,
            title_filter,
        },
        None => Target::AllUsers { title_filter },
    };

    let summary = orchestrator.run(&target).await?;
    info!(
        "Ledger at {:?} now holds {} meetings",
        orchestrator.ledger().path(),
        orchestrator.ledger().len()
    );
    Ok(summary)
}

/// List every user of the account.
pub async fn list_users(config: &Config) -> Result<Vec<User>> {
    config.validate_credentials()?;
    let (client, tokens) = connect(config).await?;
    let catalog = RecordingCatalog::new(
        client,
        &config.api.base_url,
        tokens,
        config.download.page_size,
        config.download.window_days(),
    );
    Ok(catalog.list_users().await?)
}

async fn connect(config: &Config) -> Result<(Client, Arc<TokenManager>)> {
    let client = network::build_client(config.download.connect_timeout())?;

    network::check_reachability(&client, &config.api.reachability_url)
        .await
        .context("No internet connection. Please check your network and try again")?;

    let tokens = Arc::new(TokenManager::new(
        client.clone(),
        &config.api.oauth_url,
        config.oauth.clone(),
    ));
    tokens
        .acquire()
        .await
        .context("Error loading access token")?;

    Ok((client, tokens))
}

fn apply_overrides(config: &mut Config, args: &DownloadCliArgs) {
    let download = &mut config.download;
    if args.from.is_some() {
        download.from = args.from;
    }
    if args.to.is_some() {
        download.to = args.to;
    }
    if let Some(dest) = &args.dest {
        download.directory = dest.to_string_lossy().into_owned();
    }
    if let Some(concurrency) = args.concurrency {
        download.concurrency = concurrency;
    }
    if args.skip_completed {
        download.skip_completed = true;
    }
}

fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("SIGINT or CTRL-C detected. Finishing the current file, then exiting.");
                trigger.cancel();
            }
            Err(err) => warn!("Failed to listen for CTRL-C: {err}"),
        }
    });
    token
}
