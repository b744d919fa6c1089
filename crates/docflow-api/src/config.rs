//! Server configuration from environment variables.
//!
//! | Variable                 | Default                         |
//! |--------------------------|---------------------------------|
//! | `DATABASE_URL`           | `postgres://localhost/docflow`  |
//! | `HOST`                   | `0.0.0.0`                       |
//! | `PORT`                   | `3000`                          |
//! | `DB_MAX_CONNECTIONS`     | `10`                            |
//! | `DB_STATEMENT_TIMEOUT_SECS` | `30` (`0` disables)          |
//! | `POOL_METRICS_INTERVAL_SECS` | `60` (`0` disables)         |
//! | `RATE_LIMIT_ENABLED`     | `true`                          |
//! | `RATE_LIMIT_REQUESTS`    | `100`                           |
//! | `RATE_LIMIT_PERIOD_SECS` | `60`                            |
//! | `ALLOWED_ORIGINS`        | `http://localhost:3000`         |
//! | `MAX_UPLOAD_BYTES`       | `26214400` (25 MiB)             |
//! | `RUN_MIGRATIONS`         | `true`                          |
//!
//! The rate limit admits `RATE_LIMIT_REQUESTS` per `RATE_LIMIT_PERIOD_SECS`
//! across all clients, refilled evenly over the period.

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use docflow_db::PoolConfig;
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/docflow";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_statement_timeout_secs: u64,
    pub pool_metrics_interval_secs: u64,
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_period_secs: u64,
    /// Raw comma-separated origin list
    pub allowed_origins: String,
    pub max_upload_bytes: usize,
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_max_connections: docflow_db::pool::DEFAULT_MAX_CONNECTIONS,
            db_statement_timeout_secs: 30,
            pool_metrics_interval_secs: 60,
            rate_limit_enabled: true,
            rate_limit_requests: 100,
            rate_limit_period_secs: 60,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset keys take defaults and
    /// unparsable values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(d.database_url),
            host: lookup("HOST").unwrap_or(d.host),
            port: parse_or(&lookup, "PORT", d.port),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", d.db_max_connections)
                .max(1),
            db_statement_timeout_secs: parse_or(
                &lookup,
                "DB_STATEMENT_TIMEOUT_SECS",
                d.db_statement_timeout_secs,
            ),
            pool_metrics_interval_secs: parse_or(
                &lookup,
                "POOL_METRICS_INTERVAL_SECS",
                d.pool_metrics_interval_secs,
            ),
            rate_limit_enabled: flag_or(&lookup, "RATE_LIMIT_ENABLED", d.rate_limit_enabled),
            rate_limit_requests: parse_or(&lookup, "RATE_LIMIT_REQUESTS", d.rate_limit_requests)
                .max(1),
            rate_limit_period_secs: parse_or(
                &lookup,
                "RATE_LIMIT_PERIOD_SECS",
                d.rate_limit_period_secs,
            )
            .max(1),
            allowed_origins: lookup("ALLOWED_ORIGINS").unwrap_or(d.allowed_origins),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", d.max_upload_bytes),
            run_migrations: flag_or(&lookup, "RUN_MIGRATIONS", d.run_migrations),
        }
    }

    /// Pool settings derived from the `DB_*` variables.
    pub fn pool_config(&self) -> PoolConfig {
        let statement_timeout = Some(self.db_statement_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        PoolConfig::new()
            .max_connections(self.db_max_connections)
            .statement_timeout(statement_timeout)
    }

    /// Period of the pool metrics log, if enabled.
    pub fn pool_metrics_interval(&self) -> Option<Duration> {
        Some(self.pool_metrics_interval_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse the CORS whitelist, skipping invalid entries.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Invalid CORS origin '{}': {}", trimmed, e);
                        None
                    }
                }
            })
            .collect();

        if origins.is_empty() {
            return vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)];
        }
        origins
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid number in configuration, using default");
            default
        }),
    }
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => default,
        Some(v) if v == "true" || v == "1" => true,
        Some(v) if v == "false" || v == "0" => false,
        Some(v) => {
            warn!(key, value = %v, "Invalid flag in configuration, using default");
            default
        }
    }
}
