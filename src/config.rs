// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for shahquery
//!
//! Loads configuration from .shahqueryrc.toml in current directory or ~/.config/shahquery/config.toml

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::DEFAULT_BACKEND_URL;
use crate::session::{SessionSettings, StalePolicy};

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration loaded from .shahqueryrc.toml or ~/.config/shahquery/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the search backend
    pub backend_url: Option<String>,
    /// Quiet period before suggestions are fetched
    pub debounce_ms: Option<u64>,
    /// Shortest query that asks for suggestions
    pub min_query_len: Option<usize>,
    /// What to do with suggestion responses for superseded queries
    pub stale_suggestions: Option<StalePolicy>,
    /// Per-request timeout; none means wait indefinitely
    pub request_timeout_ms: Option<u64>,
    /// Default output format (text or json)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .shahqueryrc.toml in current directory
    /// 2. ~/.config/shahquery/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".shahqueryrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("shahquery").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format
            .as_ref()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(ConfigOutputFormat::Json),
                "text" => Some(ConfigOutputFormat::Text),
                _ => None,
            })
    }

    /// Merge CLI options with config (CLI wins)
    pub fn merge_backend_url(&self, cli_value: Option<&str>) -> String {
        cli_value
            .map(str::to_owned)
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn merge_timeout(&self, cli_value: Option<u64>) -> Option<Duration> {
        cli_value
            .or(self.request_timeout_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Session tunables with CLI overrides applied
    pub fn session_settings(
        &self,
        debounce_ms: Option<u64>,
        stale: Option<StalePolicy>,
    ) -> SessionSettings {
        let defaults = SessionSettings::default();
        SessionSettings {
            debounce: debounce_ms
                .or(self.debounce_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            min_query_len: self.min_query_len.unwrap_or(defaults.min_query_len),
            stale_policy: stale
                .or(self.stale_suggestions)
                .unwrap_or(defaults.stale_policy),
        }
    }
}
