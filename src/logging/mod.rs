//! Logging and observability
//!
//! Structured logging with:
//! - Human-readable console output
//! - Configurable log levels
//! - JSON file logs with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use redcap_loader::logging::init_logging;
//! use redcap_loader::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(study_id = "999-0001", "Start sending data for subject");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use redcap_loader::log_error_with_context;
/// use redcap_loader::domain::LoaderError;
///
/// let error = LoaderError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
