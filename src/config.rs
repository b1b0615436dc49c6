use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use thiserror::Error;

use crate::auth::session::{DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_DAYS, SessionSettings};

lazy_static! {
    static ref DURATION_PART: Regex = Regex::new(r"(\d+)(ms|s|m|h|d)").unwrap();
    static ref DURATION_FULL: Regex = Regex::new(r"^(\d+(ms|s|m|h|d))+$").unwrap();
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub cors_origin: String,
    pub bcrypt_cost: u32,
    pub token_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        let server_port = parse_var("SERVER_PORT", 8080u16)?;
        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        Ok(Self {
            database_url,
            server_port,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            access_token_ttl: duration_var(
                "ACCESS_TOKEN_EXPIRY",
                Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            ),
            refresh_token_ttl: duration_var(
                "REFRESH_TOKEN_EXPIRY",
                Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            ),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            bcrypt_cost,
            token_sweep_interval: duration_var("TOKEN_SWEEP_INTERVAL", Duration::hours(1)),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            access_ttl: self.access_token_ttl,
            refresh_ttl: self.refresh_token_ttl,
            password_cost: self.bcrypt_cost,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Reads a duration variable, falling back to `default` when it is unset or unparseable.
fn duration_var(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(value) => parse_duration(&value).unwrap_or_else(|| {
            log::warn!("{}={:?} is not a valid duration, using default", name, value);
            default
        }),
        Err(_) => default,
    }
}

/// Parses durations such as `15m`, `7d` or `1h30m`.
///
/// Units are `ms`, `s`, `m`, `h` and `d`. Zero and empty durations are refused.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if !DURATION_FULL.is_match(input) {
        return None;
    }

    let mut total = Duration::zero();
    for part in DURATION_PART.captures_iter(input) {
        let amount: i64 = part[1].parse().ok()?;
        let piece = match &part[2] {
            "ms" => Duration::try_milliseconds(amount)?,
            "s" => Duration::try_seconds(amount)?,
            "m" => Duration::try_minutes(amount)?,
            "h" => Duration::try_hours(amount)?,
            "d" => Duration::try_days(amount)?,
            _ => return None,
        };
        total = total.checked_add(&piece)?;
    }

    if total <= Duration::zero() {
        return None;
    }
    Some(total)
}
