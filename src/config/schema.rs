//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main loader configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// REDCap API connection
    pub redcap: RedcapConfig,

    /// Upload behaviour
    #[serde(default)]
    pub upload: UploadConfig,

    /// Sent-event tracking
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LoaderConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.redcap.validate()?;
        self.upload.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// REDCap API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedcapConfig {
    /// API endpoint, e.g. `https://redcap.example.org/api/`
    pub api_url: String,

    /// Project API token
    /// Stored securely in memory and automatically zeroized on drop
    pub token: SecretString,

    /// Record ID field of the project
    ///
    /// When unset the first field of the project metadata is used.
    #[serde(default)]
    pub def_field: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,
}

impl RedcapConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.api_url.is_empty() {
            return Err("redcap.api_url cannot be empty".to_string());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("redcap.api_url must start with http:// or https://".to_string());
        }

        if self.token.expose_secret().is_blank() {
            return Err("redcap.token cannot be empty".to_string());
        }

        if let Some(def_field) = &self.def_field {
            if def_field.trim().is_empty() {
                return Err("redcap.def_field cannot be blank when set".to_string());
            }
        }

        if self.timeout_seconds == 0 {
            return Err("redcap.timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Upload behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum number of API calls per `rate_period_seconds`
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Length of the rate limiting window in seconds
    #[serde(default = "default_rate_period_seconds")]
    pub rate_period_seconds: u64,

    /// Stop processing a form for a subject at its first blank event
    #[serde(default)]
    pub skip_blanks: bool,

    /// Collect blank events and send them in one bulk import at the end
    #[serde(default)]
    pub bulk_send_blanks: bool,
}

impl UploadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.rate_limit == 0 {
            return Err("upload.rate_limit must be at least 1".to_string());
        }

        if self.rate_period_seconds == 0 {
            return Err("upload.rate_period_seconds must be at least 1".to_string());
        }

        if self.skip_blanks && self.bulk_send_blanks {
            return Err(
                "upload.skip_blanks and upload.bulk_send_blanks cannot both be enabled".to_string(),
            );
        }

        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            rate_period_seconds: default_rate_period_seconds(),
            skip_blanks: false,
            bulk_send_blanks: false,
        }
    }
}

/// Sent-event storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// JSON Lines file that survives between runs
    #[default]
    File,
    /// Process memory only; every run starts from scratch
    Memory,
}

/// Sent-event tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StateBackend,

    /// Path of the JSON Lines file (file backend only)
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StateBackend::File && self.path.trim().is_empty() {
            return Err("state.path cannot be empty when backend = 'file'".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rotating files
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation policy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled = true".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_rate_limit() -> u32 {
    600
}

fn default_rate_period_seconds() -> u64 {
    60
}

fn default_state_path() -> String {
    "sent_events.jsonl".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
