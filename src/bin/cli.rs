//! postwatch CLI
//!
//! One monitor pass per invocation; scheduling is left to cron or a CI
//! workflow timer.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use postwatch::{
    error::Result,
    models::Config,
    pipeline::run_monitor,
    services::{HttpFetcher, PushChannel, ServerChan},
    storage::HistoryFile,
};

/// postwatch - forum reply monitor
#[derive(Parser, Debug)]
#[command(name = "postwatch", version, about = "Forum reply monitor with push notifications")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "postwatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute one monitor pass
    Run,

    /// Validate configuration and the selector contract
    Validate,

    /// Show history-file stats
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run(config: &Config) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.crawler, config.watch.search_url())?;
    let history = HistoryFile::new(&config.history.path);
    let channel = ServerChan::from_config(&config.push)?;
    if channel.is_none() {
        log::warn!("No send key configured; notifications will be skipped");
    }

    let report = run_monitor(
        config,
        &fetcher,
        &history,
        channel.as_ref().map(|c| c as &dyn PushChannel),
        Utc::now(),
    )
    .await?;

    log::info!(
        "Run complete: {} parsed, {} new, notify {}",
        report.parsed,
        report.new_posts,
        match report.notified {
            Some(true) => "ok",
            Some(false) => "failed",
            None => "skipped",
        }
    );
    Ok(())
}

async fn info(config: &Config) {
    let history = HistoryFile::new(&config.history.path);
    match history.read().await {
        Ok(Some(store)) => {
            log::info!("History file: {}", history.path().display());
            log::info!("Entries: {}", store.entries.len());
            log::info!("Last update: {}", store.last_update);
            log::info!("Last clean: {}", store.last_clean);
        }
        Ok(None) => log::info!("No history file yet at {}", history.path().display()),
        Err(e) => log::warn!("History file unreadable: {e}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Run => match run(&config).await {
            Ok(()) => ExitCode::SUCCESS,
            // Only the fetch step fails a run; everything downstream was
            // already swallowed with a warning.
            Err(e) => {
                log::error!("Run failed: {e}");
                ExitCode::FAILURE
            }
        },

        Command::Validate => {
            log::info!("Configuration OK");
            log::info!("Watching uid {} at {}", config.watch.uid, config.watch.search_url());
            log::info!("Retention horizon: {} days", config.watch.horizon_days);
            log::info!(
                "Push: {}",
                if config.push.send_key.is_some() {
                    "configured"
                } else {
                    "not configured (notifications skipped)"
                }
            );
            ExitCode::SUCCESS
        }

        Command::Info => {
            info(&config).await;
            ExitCode::SUCCESS
        }
    }
}
