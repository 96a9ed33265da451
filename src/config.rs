
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::poller::PollerSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub filter: String,
}

impl PollingConfig {
    pub fn settings(&self) -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_millis(self.interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:5000".to_string(),
                request_timeout_secs: 30,
            },
            polling: PollingConfig {
                interval_ms: 2000,
                timeout_secs: 300,
            },
            logging: LoggingConfig {
                directory: default_log_dir(),
                filter: "medical_coding_client=info".to_string(),
            },
        }
    }
}

impl Config {
    /// Read the environment. Not validated here; command-line overrides are
    /// applied first and the caller runs [`Config::validate`] afterwards.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            api: ApiConfig {
                base_url: env::var("MEDCODE_API_URL").unwrap_or(defaults.api.base_url),
                request_timeout_secs: env::var("MEDCODE_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("MEDCODE_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            },
            polling: PollingConfig {
                interval_ms: env::var("MEDCODE_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .context("MEDCODE_POLL_INTERVAL_MS must be a whole number of milliseconds")?,
                timeout_secs: env::var("MEDCODE_POLL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .context("MEDCODE_POLL_TIMEOUT_SECS must be a whole number of seconds")?,
            },
            logging: LoggingConfig {
                directory: env::var("MEDCODE_LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.logging.directory),
                filter: env::var("MEDCODE_LOG").unwrap_or(defaults.logging.filter),
            },
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_ms == 0 {
            anyhow::bail!("poll interval must be greater than zero");
        }
        if self.polling.timeout_secs == 0 {
            anyhow::bail!("poll timeout must be greater than zero");
        }
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("API URL must not be empty");
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("medical-coding-client")
        .join("logs")
}
