//! Immutable, validated process configuration (C1).
//!
//! Loaded once at startup from the environment (optionally via a `.env`
//! file in development). Startup fails loudly if a required value is
//! absent or malformed — no lazily-discovered misconfiguration at request
//! time.

use crate::constants::defaults;
use anyhow::{bail, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub hmac_secret: String,
    pub admin_token: String,
    pub default_retention_days: i64,
    pub max_payload_bytes: usize,
    pub max_events_per_post: usize,
    pub rate_limit_per_minute: i64,
    pub rate_limit_per_ip: i64,
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let hmac_secret = require_var("HMAC_SECRET")?;
        if hmac_secret.len() < 32 {
            bail!("HMAC_SECRET must be at least 32 characters");
        }

        let admin_token = require_var("ADMIN_TOKEN")?;
        if admin_token.len() < 32 {
            bail!("ADMIN_TOKEN must be at least 32 characters");
        }

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/logsink.db?mode=rwc".to_string());

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var_or("PORT", 8080)?,
            database_url,
            hmac_secret,
            admin_token,
            default_retention_days: parse_var_or("DEFAULT_RETENTION_DAYS", defaults::RETENTION_DAYS)?,
            max_payload_bytes: parse_var_or("MAX_PAYLOAD_BYTES", defaults::MAX_PAYLOAD_BYTES)?,
            max_events_per_post: parse_var_or("MAX_EVENTS_PER_POST", defaults::MAX_EVENTS_PER_POST)?,
            rate_limit_per_minute: parse_var_or("RATE_LIMIT_PER_MINUTE", defaults::RATE_LIMIT_PER_MINUTE)?,
            rate_limit_per_ip: parse_var_or("RATE_LIMIT_PER_IP", defaults::RATE_LIMIT_PER_IP)?,
        };

        if config.max_events_per_post == 0 {
            bail!("MAX_EVENTS_PER_POST must be at least 1");
        }
        if config.default_retention_days < 1 {
            bail!("DEFAULT_RETENTION_DAYS must be at least 1");
        }

        Ok(config)
    }
}

fn require_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required environment variable {key}"))
}

fn parse_var_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}
