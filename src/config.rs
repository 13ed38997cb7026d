//! Configuration management for the risk assessment pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions
    pub transaction_subject: String,
    /// Subject for outgoing assessment decisions
    pub decision_subject: String,
    /// Queue group shared by pipeline instances
    #[serde(default = "default_queue_group")]
    pub queue_group: String,
    /// Request/reply subject for the biometric verification signal
    pub biometric_subject: String,
    /// Request/reply subject for the intent confirmation signal
    pub confirmation_subject: String,
    /// Request/reply subject for best-effort remote assessment; unset
    /// disables enrichment
    #[serde(default)]
    pub remote_assessment_subject: Option<String>,
}

fn default_queue_group() -> String {
    "risk-assessors".to_string()
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent assessment workers
    pub workers: usize,
    /// Timeout for each step-up and enrichment call, in milliseconds
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_step_timeout_ms() -> u64 {
    30_000
}

fn default_metrics_interval_secs() -> u64 {
    30
}

/// Storage locations for the JSON-backed stores
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub profiles_dir: String,
    pub policies_dir: String,
    pub history_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                decision_subject: "transactions.decisions".to_string(),
                queue_group: default_queue_group(),
                biometric_subject: "signals.biometric".to_string(),
                confirmation_subject: "signals.confirmation".to_string(),
                remote_assessment_subject: Some("signals.remote-assessment".to_string()),
            },
            pipeline: PipelineConfig {
                workers: 4,
                step_timeout_ms: default_step_timeout_ms(),
                metrics_interval_secs: default_metrics_interval_secs(),
            },
            storage: StorageConfig {
                profiles_dir: "data/profiles".to_string(),
                policies_dir: "data/policies".to_string(),
                history_dir: "data/history".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.queue_group, "risk-assessors");
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.step_timeout_ms, 30_000);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load_from_path("config/does-not-exist.toml").is_err());
    }
}
