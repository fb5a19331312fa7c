mod aggregate;
mod catalog;
mod channel;
mod cli;
mod clock;
mod config;
mod error;
mod orchestrator;
mod panel;
mod report;
mod schedule;
mod store;
mod ui;
mod weather;

use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog::FileCatalog;
use channel::LiveThreadClient;
use cli::{Cli, Command};
use config::ForecastConfig;
use orchestrator::RunOrchestrator;
use store::JsonFileStore;
use ui::RunProgress;
use weather::ForecastClient;

type Orchestrator = RunOrchestrator<JsonFileStore, FileCatalog, ForecastClient, LiveThreadClient>;

fn init_tracing(verbose: bool) {
    // Logs go to stderr; stdout carries the rendered output.
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn build_orchestrator(config: &ForecastConfig) -> Result<Orchestrator> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let weather = ForecastClient::with_base_url(
        config.weather_api_key.clone(),
        config.weather_base_url.clone(),
        timeout,
    );
    let channel = LiveThreadClient::with_base_url(
        config.channel_access_token.clone(),
        config.thread_id.clone(),
        &config.user_agent,
        config.channel_base_url.clone(),
        timeout,
    )?;
    Ok(RunOrchestrator::new(
        JsonFileStore::new(&config.state_path),
        FileCatalog::new(&config.catalog_path, config.max_locations),
        weather,
        channel,
        config.run_settings()?,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ForecastConfig::load(&cli.config)?;
    let now = cli.now.unwrap_or_else(Utc::now);
    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Command::Run => {
            if config.weather_api_key.is_empty() {
                bail!("weather API key missing: set FORECAST_WEATHER_KEY or weather_api_key");
            }
            if config.channel_access_token.is_empty() {
                bail!("channel token missing: set FORECAST_CHANNEL_TOKEN or channel_access_token");
            }

            let progress = RunProgress::start("Checking schedule...");
            let result = orchestrator.run(now).await;
            progress.complete(&result);

            let report = result?;
            if cli.verbose {
                progress.print_report(&report);
            }
        }
        Command::Status => {
            let status = orchestrator.status(now).await?;
            ui::print_status(&status);
        }
        Command::Preview => {
            if config.weather_api_key.is_empty() {
                bail!("weather API key missing: set FORECAST_WEATHER_KEY or weather_api_key");
            }

            let progress = RunProgress::start("Fetching forecasts...");
            let preview = orchestrator.preview(now).await;
            progress.clear();
            ui::print_preview(&preview?);
        }
    }

    Ok(())
}
