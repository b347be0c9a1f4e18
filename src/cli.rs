use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;

use crate::alert_feed::{FeedError, JsonlAlertFeed};
use crate::alert_state::{ActiveAlertStateStore, AlertKind, AlertStateStore, StateStoreError};
use crate::app_context::AppContext;
use crate::config::Config;
use crate::monitor::{CycleReport, simulate_alert};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser)]
#[command(
    name = "rainwatch",
    version,
    about = "City rainfall monitor and alert dispatcher"
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the monitor loop until Ctrl-C (default)
    Run,
    /// Run a single cycle, print the report and publish any due alert
    Check,
    /// Publish a drill alert without touching the alert flags
    Simulate {
        #[arg(value_enum)]
        kind: DrillKind,
    },
    /// Inspect or reset the alert session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DrillKind {
    HeavyRain,
    Flood,
}

impl From<DrillKind> for AlertKind {
    fn from(kind: DrillKind) -> Self {
        match kind {
            DrillKind::HeavyRain => AlertKind::HeavyRain,
            DrillKind::Flood => AlertKind::Flood,
        }
    }
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print which alerts were already published this session
    Status,
    /// Clear the alert flags and start a new session
    Reset,
}

pub async fn check_once(app_context: &AppContext) -> Option<CycleReport> {
    let (_stop_tx, stop_rx) = watch::channel(false);
    app_context.pipeline.check_alerts(&stop_rx).await
}

/// Needs only the feed, so a drill works while `run` holds the state store.
pub fn simulate(config: &Config, kind: DrillKind) -> Result<String, FeedError> {
    let feed = JsonlAlertFeed::from_config(config);
    let record = simulate_alert(&feed, &config.alert_titles, kind.into())?;
    Ok(format!(
        "Published drill alert at {}: {}",
        record.created_at.to_rfc3339(),
        record.title
    ))
}

pub fn session(config: &Config, action: SessionAction) -> Result<String, StateStoreError> {
    let store = ActiveAlertStateStore::open_from_config(config)?;
    apply_session_action(&store, action)
}

fn apply_session_action<S: AlertStateStore>(
    store: &S,
    action: SessionAction,
) -> Result<String, StateStoreError> {
    match action {
        SessionAction::Status => {
            let state = store.snapshot()?;
            Ok(format!(
                "Alert session: {:?}\n- heavy rain alert sent: {}\n- flood alert sent: {}",
                state.phase(),
                yes_no(state.heavy_rain_sent),
                yes_no(state.flood_sent)
            ))
        }
        SessionAction::Reset => {
            store.reset()?;
            log::warn!("alert_session_reset source=cli");
            Ok("Alert session reset. Both alerts can fire again.".to_string())
        }
    }
}

pub fn render_report(report: &CycleReport) -> String {
    let sample = &report.sample;
    let mut lines = vec![format!(
        "Cycle at {}: {} ({:.1} mm, {}% chance) from {} point(s), {} failed",
        sample.cycle_timestamp.to_rfc3339(),
        report.band,
        sample.max_precipitation_mm,
        sample.max_precipitation_probability_pct,
        sample.sample_count,
        report.failed_points
    )];

    if let Some(point) = &sample.peak_point {
        lines.push(format!("Peak: {}", point.display_name()));
    }

    let raining = report
        .raining_points()
        .map(|reading| {
            format!(
                "- {}: {:.1} mm",
                reading.point.display_name(),
                reading.precipitation_mm
            )
        })
        .collect::<Vec<_>>();
    if raining.is_empty() {
        lines.push("No rain at any monitored point.".to_string());
    } else {
        lines.push("Raining at:".to_string());
        lines.extend(raining);
    }

    match &report.alert {
        Some(alert) => lines.push(format!(
            "Published {} alert: {}",
            alert.kind, alert.record.title
        )),
        None => lines.push("No alert published.".to_string()),
    }

    lines.join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
