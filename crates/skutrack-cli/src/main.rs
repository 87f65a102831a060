mod scheduler;

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use skutrack_collector::{
    default_target_date, Collector, CollectorSettings, MpstatsSource, RunState, SheetsConnector,
};
use skutrack_core::{AppConfig, Identifier, TokioSleeper};
use tracing_subscriber::EnvFilter;

pub(crate) type ProductionCollector = Collector<MpstatsSource, SheetsConnector, TokioSleeper>;

#[derive(Debug, Parser)]
#[command(name = "skutrack")]
#[command(about = "Collects daily marketplace SKU metrics into a Google Sheet")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run once now, then every day at the configured time (default)
    Daemon,
    /// Run a single collection and exit
    Once {
        /// Target date (YYYY-MM-DD); defaults to yesterday in UTC
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Read and validate the identifier list without fetching or writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match skutrack_core::load_app_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info")?;
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    init_tracing(&config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    let collector = build_collector(&config)?;

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => run_daemon(collector, &config).await,
        Commands::Once { date, dry_run } => {
            let target_date = date.unwrap_or_else(|| default_target_date(Utc::now()));
            if dry_run {
                run_dry(&collector, target_date).await
            } else {
                run_once(&collector, target_date).await
            }
        }
    }
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

fn build_collector(config: &AppConfig) -> anyhow::Result<ProductionCollector> {
    let source =
        MpstatsSource::from_app_config(config).context("failed to build MPStats client")?;
    Ok(Collector::new(
        source,
        SheetsConnector::from_app_config(config),
        TokioSleeper,
        CollectorSettings::from_app_config(config),
    ))
}

async fn run_daemon(collector: ProductionCollector, config: &AppConfig) -> anyhow::Result<()> {
    let collector = Arc::new(collector);
    let mut scheduler =
        scheduler::build_scheduler(Arc::clone(&collector), config.daily_at).await?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let interrupted = tokio::select! {
        _ = collector.run_exclusive(default_target_date(Utc::now())) => false,
        () = &mut shutdown => true,
    };
    if !interrupted {
        tracing::info!(
            daily_at = %config.daily_at,
            "startup run finished, waiting for schedule"
        );
        shutdown.await;
    }

    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn run_once(collector: &ProductionCollector, target_date: NaiveDate) -> anyhow::Result<()> {
    let report = collector.run(target_date).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.state == RunState::Failed {
        anyhow::bail!(
            "collection run for {target_date} failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn run_dry(collector: &ProductionCollector, target_date: NaiveDate) -> anyhow::Result<()> {
    let identifiers = collector.preview(target_date).await?;
    let listed: Vec<&str> = identifiers.iter().map(Identifier::as_str).collect();
    println!(
        "dry-run: would collect {} identifiers for {target_date}: [{}]",
        identifiers.len(),
        listed.join(", ")
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping");
}
