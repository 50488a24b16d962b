use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;

use rg_schedule_scraper::{
    config::AppConfig,
    metrics::MetricsCollector,
    polling::PollingClient,
    schedule::{build_snapshot, run_cycle},
    scheduler::run_scheduler,
    types::RawPayload,
    web::{self, AppState},
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh the schedule on a timer and serve the public directory (default)
    Serve,
    /// Run a single refresh cycle and exit
    Refresh,
    /// Normalize a saved polling payload and print the schedule
    Normalize {
        /// Path to the polling JSON file
        #[arg(short, long)]
        file: PathBuf,
    },
}

async fn serve(config: AppConfig) -> Result<()> {
    let metrics = MetricsCollector::new();
    let client = PollingClient::new(&config.upstream).context("Failed to build polling client")?;

    info!("Polling {}", client.url());
    tokio::spawn(run_scheduler(
        client,
        config.schedule.output_path.clone(),
        config.schedule.refresh_interval(),
        metrics.clone(),
    ));

    web::serve(AppState { metrics }, &config.server).await
}

async fn refresh(config: AppConfig) -> Result<()> {
    let client = PollingClient::new(&config.upstream).context("Failed to build polling client")?;
    let report = run_cycle(&client, &config.schedule.output_path, Utc::now()).await?;
    info!(
        "Wrote {:?}: {} matches on {} courts ({} rejected)",
        config.schedule.output_path, report.matches, report.courts, report.rejected
    );
    Ok(())
}

async fn normalize(file: PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let payload: RawPayload = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid polling payload in {:?}", file))?;

    let built = build_snapshot(&payload, Utc::now());
    for rejected in &built.rejected {
        info!("Rejected match {} (id {}): {}", rejected.index, rejected.id, rejected.error);
    }
    println!("{}", built.snapshot.to_pretty_json()?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    // Logs go to stderr so `normalize` output stays pipeable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Refresh => refresh(config).await,
        Commands::Normalize { file } => normalize(file).await,
    }
}
