//! Server settings read from the environment

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::signaling::DEFAULT_SIGNALING_PORT;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_PONG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Only browsers served from this origin may open a socket. `None` allows any.
    pub allowed_origin: Option<String>,
    pub max_connections: Option<usize>,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_SIGNALING_PORT,
            allowed_origin: None,
            max_connections: None,
            ping_interval: DEFAULT_PING_INTERVAL,
            pong_timeout: DEFAULT_PONG_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let config = Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", get("PORT"))?.unwrap_or(defaults.port),
            allowed_origin: get("FRONTEND_URL").map(|url| url.trim_end_matches('/').to_string()),
            max_connections: parse_var("MAX_CONNECTIONS", get("MAX_CONNECTIONS"))?,
            ping_interval: parse_var("PING_INTERVAL_SECS", get("PING_INTERVAL_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ping_interval),
            pong_timeout: parse_var("PONG_TIMEOUT_SECS", get("PONG_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.pong_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    /// Keepalive timings must be non-zero; tokio panics on a zero interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ping_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "PING_INTERVAL_SECS",
                value: self.ping_interval.as_secs().to_string(),
            });
        }
        if self.pong_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "PONG_TIMEOUT_SECS",
                value: self.pong_timeout.as_secs().to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { name, value: v })
        })
        .transpose()
}
