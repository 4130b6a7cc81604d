//! API server configuration.

use std::time::Duration;

use storekeep_core::auth::jwt::TokenSettings;
use thiserror::Error;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Startup configuration errors. Any of these aborts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set or empty")]
    MissingSecret,

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Token signing secret. Never logged.
    pub jwt_secret: String,
    /// Access/refresh token lifetimes.
    pub tokens: TokenSettings,
    /// Deadline for a single store call.
    pub store_timeout: Duration,
    /// Whether the refresh cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("pg_connection_url", &self.pg_connection_url)
            .field("jwt_secret", &"<redacted>")
            .field("tokens", &self.tokens)
            .field("store_timeout", &self.store_timeout)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 366 * 24 * 60 * 60;

fn ttl(name: &'static str, secs: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(ConfigError::InvalidValue {
            name,
            value: secs.to_string(),
        });
    }
    chrono::Duration::try_seconds(secs).ok_or(ConfigError::InvalidValue {
        name,
        value: secs.to_string(),
    })
}

/// Token lifetimes from seconds. Both must lie in `1..=MAX_TOKEN_TTL_SECS`.
pub fn token_settings(access_ttl_secs: i64, refresh_ttl_secs: i64) -> Result<TokenSettings, ConfigError> {
    Ok(TokenSettings {
        access_ttl: ttl("ACCESS_TOKEN_TTL_SECS", access_ttl_secs)?,
        refresh_ttl: ttl("REFRESH_TOKEN_TTL_SECS", refresh_ttl_secs)?,
    })
}

impl ApiConfig {
    /// Validated constructor shared by the CLI and [`ApiConfig::from_env`].
    /// A blank signing secret is rejected here.
    pub fn new(
        bind_addr: impl Into<String>,
        pg_connection_url: impl Into<String>,
        jwt_secret: impl Into<String>,
        tokens: TokenSettings,
        store_timeout: Duration,
        secure_cookies: bool,
    ) -> Result<Self, ConfigError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            bind_addr: bind_addr.into(),
            pg_connection_url: pg_connection_url.into(),
            jwt_secret,
            tokens,
            store_timeout,
            secure_cookies,
        })
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                 | Default                              |
    /// |--------------------------|--------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:8000`                     |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/storekeep` |
    /// | `JWT_SECRET`             | required, non-empty                  |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `900`                                |
    /// | `REFRESH_TOKEN_TTL_SECS` | `604800`                             |
    /// | `STORE_TIMEOUT_MS`       | `5000`                               |
    /// | `SECURE_COOKIES`         | `false`                              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into()),
            std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/storekeep".into()),
            std::env::var("JWT_SECRET").unwrap_or_default(),
            token_settings(
                parse_var("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
                parse_var("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS)?,
            )?,
            Duration::from_millis(parse_var("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?),
            parse_var("SECURE_COOKIES", false)?,
        )
    }
}
