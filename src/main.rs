//! GemScout - Memecoin Discovery and Screening Pipeline
//!
//! Polls DexScreener for fresh listings, screens them through contract
//! checks and an AI risk model, and paper-trades the survivors.

mod adapters;
mod application;
mod cache;
mod config;
mod domain;
mod ports;
mod strategy;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{CheckCmd, CliApp, Command, RunCmd, ScanCmd};
use crate::adapters::{
    DexScreenerSource, GoPlusVerifier, JsonlJournal, OpenAiScorer, RetryPolicy, TelegramSink,
};
use crate::application::{AlertDispatcher, PaperBook, Pipeline, Scheduler, ShutdownHandle};
use crate::cache::MemoryCache;
use crate::config::{load_config, Config};
use crate::domain::{FastFilter, FilterConfig};
use crate::ports::alerts::{AlertSink, LogSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug);

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Scan(cmd) => scan_command(cmd).await,
        Command::Check(cmd) => check_command(cmd),
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).init();
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let scheduler = build_scheduler(&config, cmd.no_alerts)?;

    // Ctrl+C triggers a cooperative stop at the next cycle boundary.
    let handle = scheduler.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
        handle.trigger().await;
    });

    scheduler.run().await;
    tracing::info!("gemscout stopped");
    Ok(())
}

async fn scan_command(cmd: ScanCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let scheduler = build_scheduler(&config, cmd.no_alerts)?;
    scheduler.run_cycle().await;
    Ok(())
}

fn check_command(cmd: CheckCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Configuration invalid")?;
    println!("configuration OK");
    println!(
        "  scanner: every {}s, query '{}'",
        config.scanner.poll_interval_secs, config.scanner.search_query
    );
    println!("  chains: {}", config.filters.chains.join(", "));
    println!(
        "  telegram alerts: {}",
        if config.alerts.telegram_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  ai scorer: {}",
        if config.ai.get_api_key().is_some() {
            "configured"
        } else {
            "NOT configured (run will refuse to start; set AI_API_KEY or [ai].api_key)"
        }
    );
    Ok(())
}

/// Wire every component from config. Alerts fall back to the log sink
/// when Telegram is disabled or `--no-alerts` was passed.
fn build_scheduler(config: &Config, no_alerts: bool) -> Result<Arc<Scheduler>> {
    let source = Arc::new(
        DexScreenerSource::new(
            config.scanner.dexscreener_url.clone(),
            config.scanner.search_query.clone(),
            config.scanner.http_timeout_secs,
        )
        .context("Failed to create feed client")?,
    );

    let verifier = Arc::new(
        GoPlusVerifier::new(
            config.verifier.goplus_url.clone(),
            config.verifier.get_api_key(),
            config.verifier.timeout_secs,
        )
        .context("Failed to create verifier client")?,
    );

    let api_key = config.ai.get_api_key().unwrap_or_default();
    let scorer = Arc::new(
        OpenAiScorer::new(
            api_key,
            config.ai.base_url.clone(),
            config.ai.model.clone(),
            config.ai.timeout_secs,
        )
        .context("AI scorer not configured; set AI_API_KEY or [ai].api_key")?,
    );

    let sink: Arc<dyn AlertSink> = if no_alerts || !config.alerts.telegram_enabled {
        Arc::new(LogSink)
    } else {
        Arc::new(
            TelegramSink::new(
                config.alerts.get_bot_token(),
                config.alerts.get_chat_id(),
                None,
                config.scanner.http_timeout_secs,
            )
            .context("Failed to create Telegram sink")?,
        )
    };
    let dispatcher = Arc::new(AlertDispatcher::new(
        vec![sink],
        RetryPolicy::new(
            config.alerts.send_attempts,
            Duration::from_millis(500),
            Duration::from_secs(5),
        ),
    ));

    let journal = Arc::new(
        JsonlJournal::open(config.journal.expanded_path())
            .context("Failed to open event journal")?,
    );

    let cache = Arc::new(MemoryCache::with_capacity(config.cache.max_entries));

    let pipeline = Arc::new(Pipeline::new(
        FastFilter::new(FilterConfig::from(&config.filters)),
        cache,
        verifier,
        scorer,
        dispatcher.clone(),
        journal.clone(),
        config.strategy_params(),
        RetryPolicy::default_boundary(),
        config.reject_ttl(),
        config.verdict_ttl(),
    ));

    let books = config
        .strategy_params()
        .into_iter()
        .map(|p| PaperBook::new(p.name.clone(), p.fixed_balance_usd))
        .collect();

    Ok(Arc::new(Scheduler::new(
        source.clone(),
        pipeline,
        source,
        dispatcher,
        journal,
        books,
        config.poll_interval(),
        config.scanner.max_concurrency,
        ShutdownHandle::new(),
    )))
}
