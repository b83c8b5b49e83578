//! Runtime configuration from the environment (a `.env` file is loaded by the
//! binary before this is read).

use anyhow::{Context, Result};
use std::time::Duration;

use crate::fleet::FanOut;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `FLEET_BACKEND_URL`
    pub backend_url: Option<String>,
    /// `FLEET_BACKEND_KEY`
    pub backend_key: Option<String>,
    /// `FLEET_CONCURRENCY`
    pub concurrency: usize,
    /// `FLEET_LOOKUP_TIMEOUT_SECS`
    pub lookup_timeout: Duration,
    /// `FLEET_HTTP_TIMEOUT_SECS`
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_key: None,
            concurrency: DEFAULT_CONCURRENCY,
            lookup_timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let concurrency = match non_empty("FLEET_CONCURRENCY") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| {
                    format!("FLEET_CONCURRENCY must be a positive integer, got '{v}'")
                })?,
            None => defaults.concurrency,
        };
        if concurrency == 0 {
            anyhow::bail!("FLEET_CONCURRENCY must be at least 1");
        }

        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match non_empty(key) {
                Some(v) => {
                    let n = v
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("{key} must be a number of seconds, got '{v}'"))?;
                    Ok(Duration::from_secs(n))
                }
                None => Ok(default),
            }
        };

        Ok(Self {
            backend_url: non_empty("FLEET_BACKEND_URL"),
            backend_key: non_empty("FLEET_BACKEND_KEY"),
            concurrency,
            lookup_timeout: secs("FLEET_LOOKUP_TIMEOUT_SECS", defaults.lookup_timeout)?,
            http_timeout: secs("FLEET_HTTP_TIMEOUT_SECS", defaults.http_timeout)?,
        })
    }

    pub fn fan_out(&self) -> FanOut {
        FanOut {
            concurrency: self.concurrency,
            lookup_timeout: self.lookup_timeout,
        }
    }
}
