// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::warn;

const DEFAULT_DB_URL: &str = "sqlite://database/sqlite.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEV_JWT_SECRET: &str = "development-only-secret-change-me-please-0123456789";
const MIN_SECRET_LEN: usize = 32;

/// Runtime settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    /// Check-ins at or after this UTC hour are late.
    pub late_after_hour: u32,
    pub standard_shift_hours: i64,
    pub annual_leave_days: i64,
    pub rollover_interval_secs: u64,
    pub bootstrap_username: Option<String>,
    pub bootstrap_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_minutes: 720,
            late_after_hour: 9,
            standard_shift_hours: 8,
            annual_leave_days: 22,
            rollover_interval_secs: 300,
            bootstrap_username: None,
            bootstrap_password: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= MIN_SECRET_LEN => secret,
            Ok(_) => bail!("JWT_SECRET must be at least {} characters", MIN_SECRET_LEN),
            Err(_) if cfg!(debug_assertions) => {
                warn!("JWT_SECRET not set, using the development secret.");
                defaults.jwt_secret.clone()
            }
            Err(_) => bail!("JWT_SECRET must be set"),
        };

        let late_after_hour: u32 = parse_var("LATE_AFTER_HOUR", defaults.late_after_hour)?;
        if late_after_hour > 23 {
            bail!("LATE_AFTER_HOUR must be between 0 and 23, got {}", late_after_hour);
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_var(
                "BIND_ADDR",
                DEFAULT_BIND_ADDR.parse().context("Invalid default bind address")?,
            )?,
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            jwt_secret,
            jwt_expiration_minutes: parse_var(
                "JWT_EXPIRATION_MINUTES",
                defaults.jwt_expiration_minutes,
            )?,
            late_after_hour,
            standard_shift_hours: parse_var("STANDARD_SHIFT_HOURS", defaults.standard_shift_hours)?,
            annual_leave_days: parse_var("ANNUAL_LEAVE_DAYS", defaults.annual_leave_days)?,
            rollover_interval_secs: parse_var(
                "ROLLOVER_INTERVAL_SECS",
                defaults.rollover_interval_secs,
            )?,
            bootstrap_username: env::var("BOOTSTRAP_USERNAME").ok().filter(|v| !v.is_empty()),
            bootstrap_password: env::var("BOOTSTRAP_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.database_url, "sqlite://database/sqlite.db");
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.late_after_hour, 9);
        assert_eq!(config.standard_shift_hours, 8);
        assert_eq!(config.annual_leave_days, 22);
        assert_eq!(config.rollover_interval_secs, 300);
        assert!(config.jwt_secret.len() >= MIN_SECRET_LEN);
    }

    #[test]
    fn numeric_values_are_parsed_or_rejected() {
        assert_eq!(parse_value::<u64>("ROLLOVER_INTERVAL_SECS", " 60 ").unwrap(), 60);
        let err = parse_value::<i64>("ANNUAL_LEAVE_DAYS", "lots").unwrap_err();
        assert!(err.to_string().contains("ANNUAL_LEAVE_DAYS"));
    }
}
