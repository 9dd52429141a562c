//! Process configuration.
//!
//! Values come from the environment, optionally seeded from a `.env` file in
//! the working directory. Every variable except `GITHUB_SECRET` has a default.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use listener::state::{DEFAULT_MAX_BODY_BYTES, MAX_LIMIT, MAX_WINDOW_SECS};
use listener::{EventsSettings, RetrievalMode};
use pipeline::WebhookSecret;
use store::StoreBackend;
use thiserror::Error;

pub const BIND_VAR: &str = "REPOWATCH_BIND";
pub const SECRET_VAR: &str = "GITHUB_SECRET";
pub const STORE_VAR: &str = "REPOWATCH_STORE";
pub const SQLITE_PATH_VAR: &str = "REPOWATCH_SQLITE_PATH";
pub const EVENTS_MODE_VAR: &str = "REPOWATCH_EVENTS_MODE";
pub const EVENTS_LIMIT_VAR: &str = "REPOWATCH_EVENTS_LIMIT";
pub const EVENTS_WINDOW_VAR: &str = "REPOWATCH_EVENTS_WINDOW_SECS";
pub const MAX_BODY_VAR: &str = "REPOWATCH_MAX_BODY_BYTES";
pub const LOG_FORMAT_VAR: &str = "REPOWATCH_LOG_FORMAT";
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SQLITE_PATH: &str = "repowatch.db";

/// Configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error("{var} has invalid value '{value}': {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Log line rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Everything the composition root needs to start the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub secret: WebhookSecret,
    pub store: StoreBackend,
    pub events: EventsSettings,
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl ServiceConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal production case.
        let _ = dotenv::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let bind = parse(BIND_VAR, get(BIND_VAR), "a socket address like 0.0.0.0:5000", |v| {
            v.parse::<SocketAddr>().ok()
        })?
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let secret = get(SECRET_VAR)
            .and_then(WebhookSecret::new)
            .ok_or(ConfigError::Missing { var: SECRET_VAR })?;

        let store = match get(STORE_VAR).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("sqlite") => StoreBackend::Sqlite(PathBuf::from(
                get(SQLITE_PATH_VAR).unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string()),
            )),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: STORE_VAR,
                    value: other.to_string(),
                    expected: "'memory' or 'sqlite'",
                })
            }
        };

        let defaults = EventsSettings::default();
        let mode = parse(EVENTS_MODE_VAR, get(EVENTS_MODE_VAR), "'latest' or 'window'", RetrievalMode::parse)?
            .unwrap_or(defaults.mode);
        let default_limit = parse(EVENTS_LIMIT_VAR, get(EVENTS_LIMIT_VAR), "an integer between 1 and 100", |v| {
            v.parse::<usize>().ok().filter(|n| (1..=MAX_LIMIT).contains(n))
        })?
        .unwrap_or(defaults.default_limit);
        let default_window = parse(EVENTS_WINDOW_VAR, get(EVENTS_WINDOW_VAR), "seconds between 1 and 86400", |v| {
            v.parse::<u64>()
                .ok()
                .filter(|n| (1..=MAX_WINDOW_SECS).contains(n))
                .map(Duration::from_secs)
        })?
        .unwrap_or(defaults.default_window);

        let max_body_bytes = parse(MAX_BODY_VAR, get(MAX_BODY_VAR), "a positive byte count", |v| {
            v.parse::<usize>().ok().filter(|n| *n > 0)
        })?
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let log_format = parse(LOG_FORMAT_VAR, get(LOG_FORMAT_VAR), "'pretty' or 'json'", |v| {
            match v.to_ascii_lowercase().as_str() {
                "pretty" => Some(LogFormat::Pretty),
                "json" => Some(LogFormat::Json),
                _ => None,
            }
        })?
        .unwrap_or(LogFormat::Pretty);

        Ok(Self {
            bind,
            secret,
            store,
            events: EventsSettings {
                mode,
                default_limit,
                default_window,
            },
            max_body_bytes,
            log_format,
            otlp_endpoint: get(OTLP_ENDPOINT_VAR),
        })
    }
}

/// Parses `raw` with `parse_value`; `Ok(None)` when the variable is unset.
fn parse<T>(
    var: &'static str,
    raw: Option<String>,
    expected: &'static str,
    parse_value: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(value) => match parse_value(value.trim()) {
            Some(parsed) => Ok(Some(parsed)),
            None => Err(ConfigError::Invalid {
                var,
                value,
                expected,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[(SECRET_VAR, "s3cr3t")]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.events, EventsSettings::default());
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.otlp_endpoint.is_none());
        assert_eq!(config.secret.as_bytes(), b"s3cr3t");
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing { var: SECRET_VAR }
        );
        assert_eq!(
            load(&[(SECRET_VAR, "  ")]).unwrap_err(),
            ConfigError::Missing { var: SECRET_VAR }
        );
    }

    #[test]
    fn sqlite_backend_and_window_mode_are_configurable() {
        let config = load(&[
            (SECRET_VAR, "s3cr3t"),
            (STORE_VAR, "SQLite"),
            (SQLITE_PATH_VAR, "/var/lib/repowatch/events.db"),
            (EVENTS_MODE_VAR, "window"),
            (EVENTS_WINDOW_VAR, "30"),
            (LOG_FORMAT_VAR, "json"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Sqlite(PathBuf::from("/var/lib/repowatch/events.db"))
        );
        assert_eq!(config.events.mode, RetrievalMode::Window);
        assert_eq!(config.events.default_window, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[(SECRET_VAR, "s"), (EVENTS_LIMIT_VAR, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: EVENTS_LIMIT_VAR, .. }));

        let err = load(&[(SECRET_VAR, "s"), (STORE_VAR, "mongo")]).unwrap_err();
        assert!(err.to_string().starts_with(STORE_VAR));

        let err = load(&[(SECRET_VAR, "s"), (BIND_VAR, "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BIND_VAR, .. }));
    }

    #[test]
    fn debug_output_does_not_contain_secret() {
        let config = load(&[(SECRET_VAR, "hunter2")]).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
