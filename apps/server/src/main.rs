//! Buy Alert Bot - Headless Server
//!
//! Watches Starknet tokens for buys and posts alerts to Telegram chats.

mod config;
mod retention;

use buyalert_alerts::{Database, LogSink, TelegramBot, TelegramNotifier};
use buyalert_engine::{AlertSink, BuyMonitor, DedupGate, MetricsCalculator, StaticMarketData};
use buyalert_feeds::{ProviderAdapter, ProviderConfig};
use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_DATABASE_URL: &str = "sqlite://bot_data.db";

/// Buy Alert Bot CLI
#[derive(Parser, Debug)]
#[command(name = "buyalert-bot")]
#[command(about = "Starknet token buy alerts for Telegram", long_about = None)]
struct Args {
    /// Configuration file path (JSON). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Log alerts instead of sending them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config from {path}: {e}");
                return;
            }
        },
        None => AppConfig::default(),
    };

    let log_level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level);

    let database_url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok();

    info!("🚀 Buy Alert Bot starting...");
    info!("  Database: {}", database_url);
    info!("  Dry Run: {}", args.dry_run);
    info!(
        "  Sweep: every {}s (idle {}s, backoff {}s)",
        config.monitor.sweep_interval_secs,
        config.monitor.idle_interval_secs,
        config.monitor.error_backoff_secs
    );

    if bot_token.is_none() && !args.dry_run {
        error!("TELEGRAM_BOT_TOKEN is not set (use --dry-run to run without Telegram)");
        return;
    }

    let db = match Database::connect(&database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to open database");
            return;
        }
    };

    let provider_config: ProviderConfig = (&config.providers).into();
    let provider = match ProviderAdapter::new(provider_config) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!(error = %e, "Failed to build provider adapter");
            return;
        }
    };
    info!("  Event sources: {}", provider.source_names().join(" -> "));

    let telegram = bot_token.map(|token| Arc::new(TelegramBot::new(&token, db.clone())));

    let sink: Arc<dyn AlertSink> = match (&telegram, args.dry_run) {
        (Some(bot), false) => Arc::new(TelegramNotifier::new(bot.bot().clone())),
        _ => {
            warn!("Dry run: alerts will be logged, not sent");
            Arc::new(LogSink)
        }
    };

    let store = Arc::new(db.clone());
    let metrics = MetricsCalculator::new(
        provider.clone(),
        Arc::new(StaticMarketData::new(config.providers.holder_count)),
    );
    let monitor = BuyMonitor::new(
        (&config.monitor).into(),
        store.clone(),
        provider,
        DedupGate::new(store),
        metrics,
        sink,
    );

    let shutdown = CancellationToken::new();

    let monitor_handle = tokio::spawn(monitor.run(shutdown.clone()));
    let retention_handle = tokio::spawn(retention::run_retention_loop(
        db.clone(),
        config.retention.clone(),
        shutdown.clone(),
    ));
    let bot_handle = telegram.map(|bot| tokio::spawn(bot.run()));

    // Handle shutdown
    info!("Press Ctrl+C to stop...");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }

    warn!("Shutdown signal received");
    shutdown.cancel();

    // The monitor finishes its current destination before stopping, so no cap here
    info!("Waiting for the monitor to finish the current destination...");
    if let Err(e) = monitor_handle.await {
        error!(error = %e, "Monitor task failed");
    }
    let _ = tokio::time::timeout(Duration::from_secs(1), retention_handle).await;

    if let Some(mut handle) = bot_handle {
        if tokio::time::timeout(Duration::from_secs(5), &mut handle)
            .await
            .is_err()
        {
            warn!("Telegram dispatcher did not stop in time");
            handle.abort();
        }
    }

    match db.count_notified().await {
        Ok(count) => info!("📈 Notified events on record: {}", count),
        Err(e) => warn!(error = %e, "Failed to read final stats"),
    }

    info!("👋 Goodbye!");
}
