//! Configuration management for Tequila
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Nothing here is global: the loaded [`Config`] is passed explicitly to
//! the API client and the aggregators.

use crate::error::{Result, TequilaError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest week number the backend accepts
pub const BACKEND_MAX_WEEK: u32 = 36;

/// Main configuration structure for Tequila
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Week list settings
    #[serde(default)]
    pub weeks: WeeksConfig,
    /// Generation tracking settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// WebSocket event stream settings
    #[serde(default)]
    pub events: EventsConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without the `/api/v1` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value sent as `X-API-Key` on every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout. Requests never time out when unset.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_seconds: None,
        }
    }
}

/// How the week list learns which weeks exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekDiscovery {
    /// Probe compiled specs for weeks `1..=probe_through_week`
    #[default]
    Probe,
    /// Ask the backend's `GET /weeks` endpoint
    List,
}

/// What makes a discovered week count as completed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekCompleteness {
    /// A week is completed as soon as it is discovered
    #[default]
    Existence,
    /// Every field of every day must be non-empty
    Fields,
}

/// Week list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeksConfig {
    /// Number of weeks shown in the week list
    #[serde(default = "default_total_weeks")]
    pub total_weeks: u32,

    /// Last week probed for existence when discovery is `probe`
    #[serde(default = "default_probe_through_week")]
    pub probe_through_week: u32,

    /// Discovery strategy
    #[serde(default)]
    pub discovery: WeekDiscovery,

    /// Completion criterion
    #[serde(default)]
    pub completeness: WeekCompleteness,
}

fn default_total_weeks() -> u32 {
    35
}

fn default_probe_through_week() -> u32 {
    12
}

impl Default for WeeksConfig {
    fn default() -> Self {
        Self {
            total_weeks: default_total_weeks(),
            probe_through_week: default_probe_through_week(),
            discovery: WeekDiscovery::default(),
            completeness: WeekCompleteness::default(),
        }
    }
}

/// Generation tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Usage polling interval while a generation is running (milliseconds)
    #[serde(default = "default_usage_poll_interval_ms")]
    pub usage_poll_interval_ms: u64,
}

fn default_usage_poll_interval_ms() -> u64 {
    5000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            usage_poll_interval_ms: default_usage_poll_interval_ms(),
        }
    }
}

/// WebSocket event stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Keep-alive ping interval (seconds)
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
}

fn default_ping_interval() -> u64 {
    30
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            ping_interval_seconds: default_ping_interval(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TequilaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TequilaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("TEQUILA_API_URL") {
            self.api.base_url = url;
        }

        if let Ok(key) = std::env::var("TEQUILA_API_KEY") {
            self.api.api_key = if key.is_empty() { None } else { Some(key) };
        }

        if let Ok(timeout) = std::env::var("TEQUILA_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.request_timeout_seconds = Some(value);
            } else {
                tracing::warn!("Invalid TEQUILA_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(probe) = std::env::var("TEQUILA_PROBE_THROUGH_WEEK") {
            if let Ok(value) = probe.parse() {
                self.weeks.probe_through_week = value;
            } else {
                tracing::warn!("Invalid TEQUILA_PROBE_THROUGH_WEEK: {}", probe);
            }
        }

        if let Ok(discovery) = std::env::var("TEQUILA_WEEK_DISCOVERY") {
            self.weeks.discovery = match discovery.to_lowercase().as_str() {
                "probe" => WeekDiscovery::Probe,
                "list" => WeekDiscovery::List,
                _ => {
                    tracing::warn!("Invalid week discovery: {}, using default", discovery);
                    WeekDiscovery::default()
                }
            };
        }

        if let Ok(completeness) = std::env::var("TEQUILA_WEEK_COMPLETENESS") {
            self.weeks.completeness = match completeness.to_lowercase().as_str() {
                "existence" => WeekCompleteness::Existence,
                "fields" => WeekCompleteness::Fields,
                _ => {
                    tracing::warn!("Invalid week completeness: {}, using default", completeness);
                    WeekCompleteness::default()
                }
            };
        }

        if let Ok(interval) = std::env::var("TEQUILA_USAGE_POLL_INTERVAL_MS") {
            if let Ok(value) = interval.parse() {
                self.generation.usage_poll_interval_ms = value;
            } else {
                tracing::warn!("Invalid TEQUILA_USAGE_POLL_INTERVAL_MS: {}", interval);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(key) = &cli.api_key {
            self.api.api_key = Some(key.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`TequilaError::Config`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url).map_err(|e| {
            TequilaError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(TequilaError::Config(format!(
                "api.base_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.api.request_timeout_seconds == Some(0) {
            return Err(TequilaError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.weeks.total_weeks == 0 || self.weeks.total_weeks > BACKEND_MAX_WEEK {
            return Err(TequilaError::Config(format!(
                "weeks.total_weeks must be between 1 and {}",
                BACKEND_MAX_WEEK
            ))
            .into());
        }

        if self.weeks.probe_through_week == 0
            || self.weeks.probe_through_week > self.weeks.total_weeks
        {
            return Err(TequilaError::Config(format!(
                "weeks.probe_through_week must be between 1 and {}",
                self.weeks.total_weeks
            ))
            .into());
        }

        if !(1000..=60_000).contains(&self.generation.usage_poll_interval_ms) {
            return Err(TequilaError::Config(
                "generation.usage_poll_interval_ms must be between 1000 and 60000".to_string(),
            )
            .into());
        }

        if self.events.ping_interval_seconds == 0 {
            return Err(TequilaError::Config(
                "events.ping_interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
