//! Forum configuration, read once from the environment at startup.
//!
//! | Variable                    | Default                  |
//! |-----------------------------|--------------------------|
//! | `FORUM_DATABASE_URL`        | `DATABASE_URL`, required |
//! | `FORUM_HOST`                | `127.0.0.1`              |
//! | `FORUM_PORT`                | `3000`                   |
//! | `FORUM_BASE_URL`            | `http://localhost:3000`  |
//! | `FORUM_LOG_JSON`            | unset (text logs)        |
//! | `SENTRY_DSN`                | unset (Sentry disabled)  |
//! | `SENTRY_ENVIRONMENT`        | unset                    |
//! | `SENTRY_SAMPLE_RATE`        | `1.0`                    |
//! | `SENTRY_TRACES_SAMPLE_RATE` | `0.1`                    |
//!
//! A `.env` file in the working directory is loaded first when present.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {key}: {reason}")]
    InvalidEnvVar { key: &'static str, reason: String },
}

/// Error reporting settings. Sentry stays off without a DSN.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

#[derive(Debug, Clone)]
pub struct ForumConfig {
    /// Includes the password, hence `SecretString`.
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public URL. An `https` scheme marks session cookies `Secure`.
    pub base_url: String,
    pub log_json: bool,
    pub sentry: SentryConfig,
}

impl ForumConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the database URL is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal in production
        let _ = dotenvy::dotenv();

        let database_url = var("FORUM_DATABASE_URL")
            .or_else(|| var("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or(ConfigError::MissingEnvVar("FORUM_DATABASE_URL"))?;

        Ok(Self {
            database_url,
            host: parsed("FORUM_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parsed("FORUM_PORT", 3000)?,
            base_url: parse_value::<Url>(
                "FORUM_BASE_URL",
                &var("FORUM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            )?
            .into(),
            log_json: var("FORUM_LOG_JSON").is_some(),
            sentry: SentryConfig {
                dsn: var("SENTRY_DSN"),
                environment: var("SENTRY_ENVIRONMENT"),
                sample_rate: rate("SENTRY_SAMPLE_RATE", 1.0)?,
                traces_sample_rate: rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
            },
        })
    }

    /// Configuration for in-process tests: no database, no Sentry.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/coding_gurus_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: DEFAULT_BASE_URL.to_owned(),
            log_json: false,
            sentry: SentryConfig::default(),
        }
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// A set, non-empty variable.
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        key,
        reason: e.to_string(),
    })
}

/// A sampling fraction in `0.0..=1.0`.
fn rate(key: &'static str, default: f32) -> Result<f32, ConfigError> {
    let value = parsed(key, default)?;
    check_rate(key, value)
}

fn check_rate(key: &'static str, value: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEnvVar {
            key,
            reason: format!("{value} is outside 0.0..=1.0"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let addr = ForumConfig::for_tests().socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_is_secure_follows_base_url_scheme() {
        let mut config = ForumConfig::for_tests();
        assert!(!config.is_secure());

        config.base_url = "https://gurus.example.com".to_owned();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut config = ForumConfig::for_tests();
        config.database_url = SecretString::from("postgres://user:hunter2@db/forum");

        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_parse_value_reports_key() {
        assert_eq!(parse_value::<u16>("FORUM_PORT", "8080").unwrap(), 8080);

        let err = parse_value::<u16>("FORUM_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("FORUM_PORT"));
    }

    #[test]
    fn test_check_rate_bounds() {
        assert!(check_rate("RATE", 0.25).is_ok());
        assert!(check_rate("RATE", 0.0).is_ok());
        assert!(check_rate("RATE", 1.5).is_err());
        assert!(check_rate("RATE", -0.1).is_err());
    }
}
