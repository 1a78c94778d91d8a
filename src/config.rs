//! Runtime configuration.
//!
//! Defaults are embedded; an optional `config/taskqueue.toml` file and
//! `TASKQUEUE_*` environment variables layer on top.

use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Attempts a task gets before it is routed to dead letter, unless the
    /// creation request overrides it.
    pub default_max_attempts: u32,
    /// Claim lease applied when the caller does not request one, in seconds.
    pub default_lease_seconds: u64,
    /// Upper bound for caller-requested leases, in seconds.
    pub max_lease_seconds: u64,
    /// Interval between lease-expiry sweeps, in seconds.
    pub sweep_interval_seconds: u64,
    /// Cap on `limit` for list endpoints.
    pub max_page_size: u32,
    pub web: WebServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebServerConfig {
    pub bind_address: String,
    pub request_timeout_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: 3,
            default_lease_seconds: 300,
            max_lease_seconds: 3600,
            sweep_interval_seconds: 30,
            max_page_size: 100,
            web: WebServerConfig::default(),
        }
    }
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl CoreConfig {
    /// Load configuration from the optional TOML file and environment,
    /// falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/taskqueue").required(false))
            .add_source(
                config::Environment::with_prefix("TASKQUEUE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CoreError::Configuration(e.to_string()))?;

        let loaded: CoreConfig = settings
            .try_deserialize()
            .map_err(|e| CoreError::Configuration(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_max_attempts == 0 {
            return Err(CoreError::Configuration(
                "default_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.default_lease_seconds == 0 {
            return Err(CoreError::Configuration(
                "default_lease_seconds must be positive".to_string(),
            ));
        }
        if self.default_lease_seconds > self.max_lease_seconds {
            return Err(CoreError::Configuration(format!(
                "default_lease_seconds ({}) exceeds max_lease_seconds ({})",
                self.default_lease_seconds, self.max_lease_seconds
            )));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(CoreError::Configuration(
                "sweep_interval_seconds must be positive".to_string(),
            ));
        }
        if self.max_page_size == 0 {
            return Err(CoreError::Configuration(
                "max_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_lease(&self) -> Duration {
        Duration::from_secs(self.default_lease_seconds)
    }

    pub fn max_lease(&self) -> Duration {
        Duration::from_secs(self.max_lease_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}
