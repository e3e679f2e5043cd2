//! Client configuration.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use labyrinth_graph::EditorLimits;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable overriding [`ClientConfig::backend_url`].
pub const BACKEND_URL_VAR: &str = "LABYRINTH_BACKEND_URL";

/// Environment variable overriding [`ClientConfig::events_url`].
pub const EVENTS_URL_VAR: &str = "LABYRINTH_EVENTS_URL";

/// Where the backend lives and how the editor is bounded.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct ClientConfig {
    /// Base URL of the lobby/labyrinth REST API.
    #[serde(default = "default_backend_url")]
    backend_url: String,

    /// Base URL of the event stream.
    #[serde(default = "default_events_url")]
    events_url: String,

    /// Username used when none is given on the command line.
    #[serde(default)]
    username: Option<String>,

    /// Per-request timeout for backend calls.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Construction engine bounds.
    #[serde(default)]
    editor: EditorLimits,
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_events_url() -> String {
    "http://localhost:8080/events".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            events_url: default_events_url(),
            username: None,
            request_timeout_secs: default_request_timeout_secs(),
            editor: EditorLimits::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.check()?;

        info!(backend_url = %config.backend_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, otherwise the defaults, then applies the
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env())
    }

    /// Applies `LABYRINTH_BACKEND_URL` and `LABYRINTH_EVENTS_URL`.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name.
    #[instrument(skip(self, lookup))]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BACKEND_URL_VAR).filter(|url| !url.trim().is_empty()) {
            debug!(%url, "Backend URL overridden");
            self.backend_url = url;
        }
        if let Some(url) = lookup(EVENTS_URL_VAR).filter(|url| !url.trim().is_empty()) {
            debug!(%url, "Events URL overridden");
            self.events_url = url;
        }
        self
    }

    /// Backend call timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::new(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.editor.max_rows == 0 || self.editor.max_columns == 0 {
            return Err(ConfigError::new(
                "editor grid bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
