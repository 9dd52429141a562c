//! Shared handler state and the `/events` retrieval settings.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{IngestionOrchestrator, RetrievalSelection};
use serde::Deserialize;

/// Largest `?limit=` a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Largest `?window=` (seconds) a caller may request.
pub const MAX_WINDOW_SECS: u64 = 86_400;

/// GitHub caps webhook payloads at 25 MB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub events: EventsSettings,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<IngestionOrchestrator>, events: EventsSettings) -> Self {
        Self {
            orchestrator,
            events,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// The one retrieval semantic a deployment exposes on `GET /events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalMode {
    /// Most recent N events, newest first.
    #[default]
    Latest,
    /// Events from the last W seconds, oldest first.
    Window,
}

impl RetrievalMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "latest" => Some(Self::Latest),
            "window" => Some(Self::Window),
            _ => None,
        }
    }
}

/// Query parameters accepted by `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    pub limit: Option<usize>,
    pub window: Option<u64>,
}

/// Deployment-level configuration of `GET /events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventsSettings {
    pub mode: RetrievalMode,
    pub default_limit: usize,
    pub default_window: Duration,
}

impl Default for EventsSettings {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Latest,
            default_limit: 10,
            default_window: Duration::from_secs(15),
        }
    }
}

impl EventsSettings {
    /// Resolves request parameters against this deployment's mode.
    ///
    /// A selector that belongs to the other mode is an error rather than being
    /// silently ignored.
    pub fn select(&self, params: &EventsParams) -> Result<RetrievalSelection, String> {
        match self.mode {
            RetrievalMode::Latest => {
                if params.window.is_some() {
                    return Err("this deployment serves the latest events; use 'limit'".into());
                }
                let limit = params.limit.unwrap_or(self.default_limit);
                if !(1..=MAX_LIMIT).contains(&limit) {
                    return Err(format!("'limit' must be between 1 and {MAX_LIMIT}"));
                }
                Ok(RetrievalSelection::Latest { limit })
            }
            RetrievalMode::Window => {
                if params.limit.is_some() {
                    return Err("this deployment serves a time window; use 'window'".into());
                }
                let window = match params.window {
                    Some(secs) if (1..=MAX_WINDOW_SECS).contains(&secs) => Duration::from_secs(secs),
                    Some(_) => {
                        return Err(format!("'window' must be between 1 and {MAX_WINDOW_SECS} seconds"))
                    }
                    None => self.default_window,
                };
                Ok(RetrievalSelection::Window { window })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_settings() -> EventsSettings {
        EventsSettings {
            mode: RetrievalMode::Window,
            ..EventsSettings::default()
        }
    }

    #[test]
    fn latest_mode_defaults_to_ten() {
        let selection = EventsSettings::default()
            .select(&EventsParams::default())
            .unwrap();
        assert_eq!(selection, RetrievalSelection::Latest { limit: 10 });
    }

    #[test]
    fn window_mode_defaults_to_fifteen_seconds() {
        let selection = window_settings().select(&EventsParams::default()).unwrap();
        assert_eq!(
            selection,
            RetrievalSelection::Window {
                window: Duration::from_secs(15)
            }
        );
    }

    #[test]
    fn selectors_for_the_other_mode_are_rejected() {
        let window_param = EventsParams {
            window: Some(30),
            ..Default::default()
        };
        assert!(EventsSettings::default().select(&window_param).is_err());

        let limit_param = EventsParams {
            limit: Some(5),
            ..Default::default()
        };
        assert!(window_settings().select(&limit_param).is_err());
    }

    #[test]
    fn out_of_range_selectors_are_rejected() {
        for limit in [0, MAX_LIMIT + 1] {
            let params = EventsParams {
                limit: Some(limit),
                ..Default::default()
            };
            assert!(EventsSettings::default().select(&params).is_err());
        }
        let params = EventsParams {
            window: Some(0),
            ..Default::default()
        };
        assert!(window_settings().select(&params).is_err());
    }

    #[test]
    fn mode_names_parse_case_insensitively() {
        assert_eq!(RetrievalMode::parse("Window"), Some(RetrievalMode::Window));
        assert_eq!(RetrievalMode::parse("latest"), Some(RetrievalMode::Latest));
        assert_eq!(RetrievalMode::parse("both"), None);
    }
}
