use anyhow::{Context, Result};
use std::{env, str::FromStr, time::Duration};

use crate::resources::logs::DEFAULT_LOG_CAPACITY;

/// Application configuration loaded at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Where the device is reachable
    pub device: DeviceConfig,

    /// Recurring poll periods
    pub polling: PollingConfig,

    /// Maximum number of retained log entries
    pub log_capacity: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    pub status_interval: Duration,
    pub log_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            polling: PollingConfig::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "emonesp.local".to_string(),
            port: 80,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_millis(1000),
            log_interval: Duration::from_millis(2000),
        }
    }
}

impl AppConfig {
    /// Load the configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load the configuration through `lookup`, falling back to defaults for
    /// every variable it does not know
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let device = DeviceConfig::load(&lookup)?;
        let polling = PollingConfig::load(&lookup)?;
        let log_capacity = parse_var(&lookup, "LOG_CAPACITY", DEFAULT_LOG_CAPACITY)?;

        Ok(Self {
            device,
            polling,
            log_capacity,
        })
    }
}

impl DeviceConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let host = lookup("DEVICE_HOST").unwrap_or(defaults.host);
        let port = parse_var(lookup, "DEVICE_PORT", defaults.port)?;

        anyhow::ensure!(!host.is_empty(), "failed to load DEVICE_HOST: empty host");

        Ok(Self { host, port })
    }

    /// Base URL of the device web server; the default HTTP port is left out
    pub fn base_url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl PollingConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let status_ms = parse_var(lookup, "STATUS_POLL_INTERVAL_MS", 1000u64)?;
        let log_ms = parse_var(lookup, "LOG_POLL_INTERVAL_MS", 2000u64)?;

        Ok(Self {
            status_interval: Duration::from_millis(status_ms),
            log_interval: Duration::from_millis(log_ms),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {name}: invalid format")),
        None => Ok(default),
    }
}
