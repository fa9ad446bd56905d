//! Runtime configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::agreement::format::default_output_dir;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SESSION_MAX_CAPACITY: u64 = 10_000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8080";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub output_dir: PathBuf,
    pub session_max_capacity: u64,
    pub session_idle: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            output_dir: default_output_dir(),
            session_max_capacity: DEFAULT_SESSION_MAX_CAPACITY,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            cors_allowed_origins: parse_origins(DEFAULT_CORS_ORIGINS),
        }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup. Unset keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let idle_secs = parse_number(
            "SESSION_IDLE_SECS",
            lookup("SESSION_IDLE_SECS"),
            DEFAULT_SESSION_IDLE_SECS,
        )?;

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_number("PORT", lookup("PORT"), defaults.port)?,
            output_dir: lookup("AGREEMENT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            session_max_capacity: parse_number(
                "SESSION_MAX_CAPACITY",
                lookup("SESSION_MAX_CAPACITY"),
                defaults.session_max_capacity,
            )?,
            session_idle: Duration::from_secs(idle_secs),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|value| parse_origins(&value))
                .unwrap_or(defaults.cors_allowed_origins),
        })
    }
}
