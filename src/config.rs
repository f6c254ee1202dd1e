// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `KEYS_DIR` | Directory of `<kid>.pem` private keys | `keys/` |
//! | `ACTIVE_KID` | KID used to sign new tokens | Required |
//! | `TOKEN_ISSUER` | `iss` claim of minted tokens | `authgate` |
//! | `TOKEN_TTL_SECS` | Token lifetime in seconds | `3600` |
//! | `SHUTDOWN_TIMEOUT_SECS` | Graceful drain deadline | `20` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SEED_ADMIN_EMAIL` | Admin user created at startup | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password for the seeded admin | Optional |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const KEYS_DIR_ENV: &str = "KEYS_DIR";
pub const ACTIVE_KID_ENV: &str = "ACTIVE_KID";
pub const TOKEN_ISSUER_ENV: &str = "TOKEN_ISSUER";
pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";
pub const SHUTDOWN_TIMEOUT_SECS_ENV: &str = "SHUTDOWN_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Credentials for the admin user seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub keys_dir: PathBuf,
    pub active_kid: String,
    pub token_issuer: String,
    pub token_ttl: Duration,
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
    pub seed_admin: Option<SeedAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let active_kid = get(ACTIVE_KID_ENV).ok_or(ConfigError::Missing(ACTIVE_KID_ENV))?;

        let seed_admin = match (get(SEED_ADMIN_EMAIL_ENV), get(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Incomplete(
                    SEED_ADMIN_EMAIL_ENV,
                    SEED_ADMIN_PASSWORD_ENV,
                ))
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse(PORT_ENV, get(PORT_ENV), 3000)?,
            keys_dir: get(KEYS_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("keys/")),
            active_kid,
            token_issuer: get(TOKEN_ISSUER_ENV).unwrap_or_else(|| "authgate".to_string()),
            token_ttl: Duration::from_secs(parse(
                TOKEN_TTL_SECS_ENV,
                get(TOKEN_TTL_SECS_ENV),
                3600,
            )?),
            shutdown_timeout: Duration::from_secs(parse(
                SHUTDOWN_TIMEOUT_SECS_ENV,
                get(SHUTDOWN_TIMEOUT_SECS_ENV),
                20,
            )?),
            log_format: parse(LOG_FORMAT_ENV, get(LOG_FORMAT_ENV), LogFormat::Pretty)?,
            seed_admin,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: self.host.clone(),
            })
    }
}

fn parse<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
