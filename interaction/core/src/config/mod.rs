//! TOML Configuration File Support
//!
//! Centralized configuration for the interaction core, loaded from
//! `~/.config/snapfeed/interaction.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [gesture]
//! double_tap_window_ms = 300
//! triple_tap_window_ms = 400
//! long_press_delay_ms = 500
//! move_threshold_px = 10.0
//!
//! # Present section: absent gestures are unmapped
//! [gesture.mapping]
//! double_tap = "primary"
//! triple_tap = "middle"
//! long_press = "secondary"
//!
//! [stream]
//! endpoint = "http://localhost:8000/langchain/completions"
//! connect_timeout_ms = 5000
//! request_timeout_ms = 120000
//! temperature = 0.7
//! max_tokens = 512
//! system_prompt = "You are a helpful feed assistant."
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::{GestureConfig, GestureMapping, PointerButton};
use crate::streaming::{ChatRequest, StreamRequest};

/// Endpoint used when none is configured
pub const DEFAULT_STREAM_ENDPOINT: &str = "http://localhost:8000/langchain/completions";

/// Highest accepted sampling temperature
pub const MAX_TEMPERATURE: f32 = 2.0;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Gesture section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureToml {
    /// Quiet window after the first and second tap
    pub double_tap_window_ms: Option<u64>,

    /// Quiet window after the third tap
    pub triple_tap_window_ms: Option<u64>,

    /// Hold time before a contact becomes a long-press
    pub long_press_delay_ms: Option<u64>,

    /// Maximum tap displacement in pixels
    pub move_threshold_px: Option<f64>,

    /// Gesture to button mapping; replaces the default mapping when present
    pub mapping: Option<MappingToml>,
}

/// `[gesture.mapping]` table
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingToml {
    /// Button for a single tap
    pub single_tap: Option<PointerButton>,

    /// Button for a double tap
    pub double_tap: Option<PointerButton>,

    /// Button for a triple tap
    pub triple_tap: Option<PointerButton>,

    /// Button held for a long-press
    pub long_press: Option<PointerButton>,
}

impl From<&MappingToml> for GestureMapping {
    fn from(toml: &MappingToml) -> Self {
        Self {
            single_tap: toml.single_tap,
            double_tap: toml.double_tap,
            triple_tap: toml.triple_tap,
            long_press: toml.long_press,
        }
    }
}

/// Stream section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamToml {
    /// Chat completions endpoint URL
    pub endpoint: Option<String>,

    /// Bearer token
    pub api_key: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Timeout for non-streaming requests in milliseconds
    pub request_timeout_ms: Option<u64>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Response token limit
    pub max_tokens: Option<u32>,

    /// System prompt sent ahead of every user prompt
    pub system_prompt: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionToml {
    /// Gesture configuration section
    pub gesture: GestureToml,

    /// Stream configuration section
    pub stream: StreamToml,
}

// =============================================================================
// Main Configuration Structs
// =============================================================================

/// Resolved stream settings
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,

    /// Bearer token
    pub api_key: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Timeout for non-streaming requests in milliseconds
    pub request_timeout_ms: u64,

    /// Sampling temperature (omitted from requests when unset)
    pub temperature: Option<f32>,

    /// Response token limit (omitted from requests when unset)
    pub max_tokens: Option<u32>,

    /// System prompt
    pub system_prompt: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STREAM_ENDPOINT.to_string(),
            api_key: None,
            connect_timeout_ms: 5000,
            request_timeout_ms: 120_000,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
        }
    }
}

impl StreamConfig {
    /// Build a streaming request for `prompt` from these settings
    #[must_use]
    pub fn request(&self, prompt: impl Into<String>) -> StreamRequest {
        let mut body = ChatRequest::from_prompt(prompt, self.system_prompt.as_deref());
        body.temperature = self.temperature;
        body.max_tokens = self.max_tokens;

        let request = StreamRequest::new(self.endpoint.clone(), body);
        match &self.api_key {
            Some(key) => request.with_api_key(key.clone()),
            None => request,
        }
    }
}

/// Centralized configuration for the interaction core
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Gesture timing
    pub gesture: GestureConfig,

    /// Gesture to button mapping
    pub mapping: GestureMapping,

    /// Stream transport settings
    pub stream: StreamConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            mapping: GestureMapping::default(),
            stream: StreamConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl InteractionConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gesture = &self.gesture;
        for (name, value) in [
            ("gesture.double_tap_window_ms", gesture.double_tap_window_ms),
            ("gesture.triple_tap_window_ms", gesture.triple_tap_window_ms),
            ("gesture.long_press_delay_ms", gesture.long_press_delay_ms),
            ("stream.connect_timeout_ms", self.stream.connect_timeout_ms),
            ("stream.request_timeout_ms", self.stream.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        if !gesture.move_threshold_px.is_finite() || gesture.move_threshold_px < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "gesture.move_threshold_px must be a non-negative number, got {}",
                gesture.move_threshold_px
            )));
        }

        if let Some(temperature) = self.stream.temperature {
            if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "stream.temperature must be within 0.0..={MAX_TEMPERATURE}, got {temperature}"
                )));
            }
        }

        if self.stream.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "stream.endpoint must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/snapfeed/interaction.toml` or
/// `~/.config/snapfeed/interaction.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("snapfeed").join("interaction.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values are out of range. A missing config file is not an error.
pub fn load_config() -> Result<InteractionConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed or
/// validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<InteractionConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<InteractionConfig, ConfigError> {
    // Start with defaults
    let mut config = InteractionConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: InteractionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut InteractionConfig, toml: &InteractionToml) {
    // Gesture settings
    if let Some(window) = toml.gesture.double_tap_window_ms {
        config.gesture.double_tap_window_ms = window;
    }
    if let Some(window) = toml.gesture.triple_tap_window_ms {
        config.gesture.triple_tap_window_ms = window;
    }
    if let Some(delay) = toml.gesture.long_press_delay_ms {
        config.gesture.long_press_delay_ms = delay;
    }
    if let Some(threshold) = toml.gesture.move_threshold_px {
        config.gesture.move_threshold_px = threshold;
    }
    if let Some(ref mapping) = toml.gesture.mapping {
        config.mapping = GestureMapping::from(mapping);
    }

    // Stream settings
    if let Some(ref endpoint) = toml.stream.endpoint {
        config.stream.endpoint.clone_from(endpoint);
    }
    if toml.stream.api_key.is_some() {
        config.stream.api_key.clone_from(&toml.stream.api_key);
    }
    if let Some(timeout) = toml.stream.connect_timeout_ms {
        config.stream.connect_timeout_ms = timeout;
    }
    if let Some(timeout) = toml.stream.request_timeout_ms {
        config.stream.request_timeout_ms = timeout;
    }
    if toml.stream.temperature.is_some() {
        config.stream.temperature = toml.stream.temperature;
    }
    if toml.stream.max_tokens.is_some() {
        config.stream.max_tokens = toml.stream.max_tokens;
    }
    if toml.stream.system_prompt.is_some() {
        config.stream.system_prompt.clone_from(&toml.stream.system_prompt);
    }
}

/// Parse an environment value, warning (and ignoring it) when malformed
fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value, "Ignoring malformed environment override");
    }
    parsed
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut InteractionConfig, env: impl Fn(&str) -> Option<String>) {
    // Stream settings from environment
    if let Some(endpoint) = env("INTERACTION_STREAM_ENDPOINT") {
        config.stream.endpoint = endpoint;
        config.source = ConfigSource::Env;
    }
    if let Some(key) = env("INTERACTION_API_KEY") {
        config.stream.api_key = Some(key);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("INTERACTION_CONNECT_TIMEOUT") {
        if let Some(ms) = parse_env("INTERACTION_CONNECT_TIMEOUT", &timeout) {
            config.stream.connect_timeout_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(temperature) = env("INTERACTION_TEMPERATURE") {
        if let Some(t) = parse_env("INTERACTION_TEMPERATURE", &temperature) {
            config.stream.temperature = Some(t);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(max_tokens) = env("INTERACTION_MAX_TOKENS") {
        if let Some(n) = parse_env("INTERACTION_MAX_TOKENS", &max_tokens) {
            config.stream.max_tokens = Some(n);
            config.source = ConfigSource::Env;
        }
    }

    // Gesture settings from environment
    if let Some(delay) = env("INTERACTION_LONG_PRESS_MS") {
        if let Some(ms) = parse_env("INTERACTION_LONG_PRESS_MS", &delay) {
            config.gesture.long_press_delay_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(threshold) = env("INTERACTION_MOVE_THRESHOLD_PX") {
        if let Some(px) = parse_env("INTERACTION_MOVE_THRESHOLD_PX", &threshold) {
            config.gesture.move_threshold_px = px;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides,
/// then call [`InteractionConfig::validate`] again.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,

    /// Temperature override
    pub temperature: Option<f32>,

    /// Max tokens override
    pub max_tokens: Option<u32>,

    /// System prompt override
    pub system_prompt: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set temperature override
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens override
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set system prompt override
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.temperature.is_none()
            && self.max_tokens.is_none()
            && self.system_prompt.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut InteractionConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref endpoint) = self.endpoint {
            config.stream.endpoint.clone_from(endpoint);
        }
        if self.temperature.is_some() {
            config.stream.temperature = self.temperature;
        }
        if self.max_tokens.is_some() {
            config.stream.max_tokens = self.max_tokens;
        }
        if self.system_prompt.is_some() {
            config.stream.system_prompt.clone_from(&self.system_prompt);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
