//! # Pulse Demo
//!
//! Runs a small Pulse scenario: readings through a stream, acknowledgements
//! through a channel, and release notifications on both sides.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! pulse-demo
//!
//! # Run with a custom config file
//! PULSE_CONFIG=/path/to/pulse.toml pulse-demo
//!
//! # Run with environment variables
//! PULSE_COUNT=100 PULSE_PRIORITY=high RUST_LOG=pulse_core=trace pulse-demo
//! ```

mod config;
mod metrics;
mod runner;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_core=debug,pulse_demo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    info!(pulses = config.pulses, priority = %config.priority.default, "Starting Pulse demo");

    // Initialize metrics
    metrics::init_metrics();
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let summary = runner::run(&config).await?;

    info!(
        sent = summary.sent,
        rejected = summary.rejected,
        acknowledged = summary.acknowledged,
        notices = summary.notices,
        "Pulse demo finished"
    );

    Ok(())
}
