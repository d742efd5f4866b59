//! Environment-driven configuration

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.telegram.org";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// How updates reach the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Polling,
    Webhook,
}

impl FromStr for DeliveryMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" => Ok(DeliveryMode::Polling),
            "webhook" => Ok(DeliveryMode::Webhook),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_url: String,
    pub mode: DeliveryMode,
    pub port: u16,
    /// Public URL registered with Telegram in webhook mode
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub poll_timeout: Duration,
    /// `None` disables session expiry
    pub session_ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let token = non_blank(lookup("TELEGRAM_TOKEN"))
        .ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;

        let api_url =
            non_blank(lookup("TELEGRAM_API_URL")).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let mode = parse_or(
            "NUTRIBOT_MODE",
            lookup("NUTRIBOT_MODE"),
            "polling or webhook",
            DeliveryMode::Polling,
        )?;

        let port = parse_or(
            "NUTRIBOT_PORT",
            lookup("NUTRIBOT_PORT"),
            "a port number",
            DEFAULT_PORT,
        )?;

        let poll_timeout = Duration::from_secs(parse_or(
            "NUTRIBOT_POLL_TIMEOUT_SECS",
            lookup("NUTRIBOT_POLL_TIMEOUT_SECS"),
            "a number of seconds",
            DEFAULT_POLL_TIMEOUT_SECS,
        )?);

        let session_ttl = match parse_or(
            "NUTRIBOT_SESSION_TTL_SECS",
            lookup("NUTRIBOT_SESSION_TTL_SECS"),
            "a number of seconds",
            DEFAULT_SESSION_TTL_SECS,
        )? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let sweep_interval_secs = parse_or(
            "NUTRIBOT_SWEEP_INTERVAL_SECS",
            lookup("NUTRIBOT_SWEEP_INTERVAL_SECS"),
            "a positive number of seconds",
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "NUTRIBOT_SWEEP_INTERVAL_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            token,
            api_url,
            mode,
            port,
            webhook_url: non_blank(lookup("NUTRIBOT_WEBHOOK_URL")),
            webhook_secret: non_blank(lookup("TELEGRAM_WEBHOOK_SECRET")),
            poll_timeout,
            session_ttl,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        })
    }
}

/// Missing, empty and whitespace-only values all count as unset
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse an optional value, falling back to `default` when unset
pub fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match non_blank(value) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}
