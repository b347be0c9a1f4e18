mod alert_feed;
mod alert_state;
mod app_context;
mod cli;
mod config;
mod jobs;
mod monitor;
mod points;
mod weather;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::alert_state::AlertStateStore;
use crate::app_context::AppContext;
use crate::cli::{Cli, Commands};
use crate::config::{Config, load_config};
use crate::jobs::start_background_jobs;

fn init_json_logging() {
    if let Err(error) = tracing_log::LogTracer::init() {
        eprintln!(
            "logging bridge initialization failed (continuing with existing logger): {}",
            error
        );
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .finish();

    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("global logger initialization failed: {}", error);
    }
}

async fn run_until_shutdown(app_context: AppContext) {
    log::info!(
        "Rainwatch is starting... points={} interval_secs={} simulation={}",
        app_context.config.points.len(),
        app_context.config.monitor_interval_secs,
        app_context.config.simulation.enabled
    );
    if app_context.config.points.is_empty() {
        log::warn!("monitor_points_empty reason=no_points_configured");
    }

    log::info!(
        "alert_feed_ready path={}",
        app_context.pipeline.publisher().path().display()
    );
    match app_context.pipeline.store().snapshot() {
        Ok(state) => log::info!(
            "alert_session_loaded phase={:?} heavy_rain_sent={} flood_sent={}",
            state.phase(),
            state.heavy_rain_sent,
            state.flood_sent
        ),
        Err(error) => log::warn!("alert_session_unreadable error={}", error),
    }
    let handle = start_background_jobs(&app_context);

    if let Err(error) = tokio::signal::ctrl_c().await {
        log::error!("shutdown_signal_unavailable error={}", error);
    }

    log::info!("shutdown_requested source=ctrl_c");
    handle.stop().await;
}

fn build_context(config: Config) -> Option<AppContext> {
    match AppContext::new(config) {
        Ok(app_context) => Some(app_context),
        Err(error) => {
            log::error!("Startup failed: {}", error);
            None
        }
    }
}

// Main
#[tokio::main]
async fn main() -> ExitCode {
    init_json_logging();
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            log::error!("Configuration error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let Some(app_context) = build_context(config) else {
                return ExitCode::FAILURE;
            };
            run_until_shutdown(app_context).await;
            ExitCode::SUCCESS
        }
        Commands::Check => {
            let Some(app_context) = build_context(config) else {
                return ExitCode::FAILURE;
            };
            match cli::check_once(&app_context).await {
                Some(report) => {
                    println!("{}", cli::render_report(&report));
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("Cycle did not run.");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Simulate { kind } => match cli::simulate(&config, kind) {
            Ok(message) => {
                println!("{}", message);
                ExitCode::SUCCESS
            }
            Err(error) => {
                log::error!("CRITICAL: drill alert failed: {}", error);
                ExitCode::FAILURE
            }
        },
        Commands::Session { action } => match cli::session(&config, action) {
            Ok(message) => {
                println!("{}", message);
                ExitCode::SUCCESS
            }
            Err(error) => {
                log::error!("alert_session_command_failed error={}", error);
                ExitCode::FAILURE
            }
        },
    }
}
