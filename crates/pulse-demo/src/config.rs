//! Demo configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (PULSE_*)
//! - TOML configuration file

use anyhow::{Context, Result};
use pulse_core::Priority;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of readings sent through the stream.
    #[serde(default = "default_pulses")]
    pub pulses: usize,

    /// Flag every reading for debugging.
    #[serde(default)]
    pub debug: bool,

    /// Tags attached to every reading.
    #[serde(default)]
    pub tags: Vec<String>,

    /// How long to wait for in-flight handlers after release, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Priority configuration.
    #[serde(default)]
    pub priority: PriorityConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Priority configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityConfig {
    /// Priority for readings: `background`, `low`, `medium`, `high`, or
    /// `cycle` to rotate through all of them.
    #[serde(default = "default_priority")]
    pub default: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_pulses() -> usize {
    std::env::var("PULSE_COUNT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8)
}

fn default_settle_ms() -> u64 {
    250
}

fn default_priority() -> String {
    std::env::var("PULSE_PRIORITY").unwrap_or_else(|_| "cycle".to_string())
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pulses: default_pulses(),
            debug: false,
            tags: Vec::new(),
            settle_ms: default_settle_ms(),
            priority: PriorityConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            default: default_priority(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// `PULSE_CONFIG` names an explicit file; otherwise the default paths are
    /// searched.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("PULSE_CONFIG") {
            return Self::from_file(shellexpand::tilde(&path).as_ref());
        }

        let config_paths = [
            "pulse.toml",
            "/etc/pulse/pulse.toml",
            "~/.config/pulse/pulse.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Priority for the `index`-th reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured priority is not recognised.
    pub fn priority_for(&self, index: usize) -> Result<Priority> {
        if self.priority.default.eq_ignore_ascii_case("cycle") {
            return Ok(Priority::ALL[index % Priority::ALL.len()]);
        }
        self.priority
            .default
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}: {}", self.priority.default))
    }

    /// Settle time as a duration.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
