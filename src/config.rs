// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! [`AppConfig`]. Parsing goes through [`AppConfig::from_lookup`] so tests can
//! feed variables without touching the process environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding `sns.redb` | `./data` |
//! | `JWT_SECRET_KEY` | HMAC secret for tokens (at least 32 bytes) | Required |
//! | `JWT_TOKEN_TTL_SECS` | Token lifetime in seconds | `2592000` (30 days) |
//! | `ALARM_DELIVERY` | `inline` or `queued` | `inline` |
//! | `ALARM_MAX_ATTEMPTS` | Worker attempts per queued alarm (min 2) | `3` |
//! | `DEV_ROUTES` | Enable `/api-dev/v1` routes | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::alarm::worker::DEFAULT_MAX_ATTEMPTS;
use crate::alarm::DeliveryMode;
use crate::telemetry::LogFormat;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";
pub const JWT_TTL_ENV: &str = "JWT_TOKEN_TTL_SECS";
pub const ALARM_DELIVERY_ENV: &str = "ALARM_DELIVERY";
pub const ALARM_MAX_ATTEMPTS_ENV: &str = "ALARM_MAX_ATTEMPTS";
pub const DEV_ROUTES_ENV: &str = "DEV_ROUTES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Shortest accepted token secret.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{JWT_SECRET_ENV} must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort,

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the server needs to start.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: Vec<u8>,
    pub token_ttl: chrono::Duration,
    pub alarm_delivery: DeliveryMode,
    pub alarm_max_attempts: u32,
    pub dev_routes: bool,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("alarm_delivery", &self.alarm_delivery)
            .field("alarm_max_attempts", &self.alarm_max_attempts)
            .field("dev_routes", &self.dev_routes)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup(PORT_ENV) {
            Some(value) => parse(PORT_ENV, value)?,
            None => 8080,
        };

        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let jwt_secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?
            .into_bytes();
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort);
        }

        let ttl_secs: i64 = match lookup(JWT_TTL_ENV) {
            Some(value) => parse(JWT_TTL_ENV, value)?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: JWT_TTL_ENV,
                value: ttl_secs.to_string(),
            });
        }

        let alarm_delivery = match lookup(ALARM_DELIVERY_ENV) {
            Some(value) => DeliveryMode::parse(&value).ok_or(ConfigError::Invalid {
                name: ALARM_DELIVERY_ENV,
                value,
            })?,
            None => DeliveryMode::Inline,
        };

        let alarm_max_attempts = match lookup(ALARM_MAX_ATTEMPTS_ENV) {
            Some(value) => parse::<u32>(ALARM_MAX_ATTEMPTS_ENV, value)?.max(2),
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let dev_routes = match lookup(DEV_ROUTES_ENV) {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: DEV_ROUTES_ENV,
                        value,
                    })
                }
            },
            None => false,
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(value) => LogFormat::parse(&value).ok_or(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                value,
            })?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            jwt_secret,
            token_ttl: chrono::Duration::seconds(ttl_secs),
            alarm_delivery,
            alarm_max_attempts,
            dev_routes,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.token_ttl, chrono::Duration::days(30));
        assert_eq!(config.alarm_delivery, DeliveryMode::Inline);
        assert_eq!(config.alarm_max_attempts, 3);
        assert!(!config.dev_routes);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn secret_is_required_and_long_enough() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing(JWT_SECRET_ENV));
        assert_eq!(
            load(&[(JWT_SECRET_ENV, "short")]).unwrap_err(),
            ConfigError::SecretTooShort
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (PORT_ENV, "9000"),
            (JWT_TTL_ENV, "60"),
            (ALARM_DELIVERY_ENV, "queued"),
            (ALARM_MAX_ATTEMPTS_ENV, "1"),
            (DEV_ROUTES_ENV, "true"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.token_ttl, chrono::Duration::seconds(60));
        assert_eq!(config.alarm_delivery, DeliveryMode::Queued);
        assert_eq!(config.alarm_max_attempts, 2);
        assert!(config.dev_routes);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_rejected() {
        for (name, value) in [
            (PORT_ENV, "eighty"),
            (JWT_TTL_ENV, "-5"),
            (ALARM_DELIVERY_ENV, "kafka"),
            (DEV_ROUTES_ENV, "maybe"),
            (LOG_FORMAT_ENV, "xml"),
        ] {
            let result = load(&[(JWT_SECRET_ENV, SECRET), (name, value)]);
            assert!(
                matches!(result, Err(ConfigError::Invalid { name: n, .. }) if n == name),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
