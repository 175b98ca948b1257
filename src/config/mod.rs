//! Configuration management for the loader.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The configuration supports:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REDCAP_LOADER_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`RedcapConfig`] - REDCap API endpoint, token and record ID field
//! - [`UploadConfig`] - Rate limit and blank-event policy
//! - [`StateConfig`] - Where sent events are remembered
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [redcap]
//! api_url = "https://redcap.example.org/api/"
//! token = "${REDCAP_API_TOKEN}"
//!
//! [upload]
//! rate_limit = 600
//! rate_period_seconds = 60
//! skip_blanks = false
//! bulk_send_blanks = true
//!
//! [state]
//! backend = "file"
//! path = "sent_events.jsonl"
//! ```
//!
//! ```rust,no_run
//! use redcap_loader::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redcap-loader.toml")?;
//! println!("REDCap API: {}", config.redcap.api_url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, LoaderConfig, LoggingConfig, RedcapConfig, StateBackend, StateConfig,
    UploadConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
