//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{LoaderConfig, StateBackend};
use crate::config::secret_string;
use crate::domain::errors::LoaderError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into LoaderConfig
/// 4. Applies environment variable overrides (REDCAP_LOADER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `LoaderError::Configuration` if the file is missing or unreadable,
/// a referenced variable is unset, the TOML is invalid or validation fails.
///
/// # Examples
///
/// ```no_run
/// use redcap_loader::config::loader::load_config;
///
/// let config = load_config("redcap-loader.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LoaderConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoaderError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        LoaderError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: LoaderConfig = toml::from_str(&contents)
        .map_err(|e| LoaderError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        LoaderError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| LoaderError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(LoaderError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the REDCAP_LOADER_* prefix
///
/// Variables follow the pattern REDCAP_LOADER_<SECTION>_<KEY>, for example
/// REDCAP_LOADER_REDCAP_TOKEN or REDCAP_LOADER_UPLOAD_RATE_LIMIT. Values that
/// fail to parse are ignored.
fn apply_env_overrides(config: &mut LoaderConfig) {
    if let Ok(val) = std::env::var("REDCAP_LOADER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("REDCAP_LOADER_REDCAP_API_URL") {
        config.redcap.api_url = val;
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_REDCAP_TOKEN") {
        config.redcap.token = secret_string(val);
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_REDCAP_DEF_FIELD") {
        config.redcap.def_field = Some(val);
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_REDCAP_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.redcap.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_REDCAP_TLS_VERIFY") {
        config.redcap.tls_verify = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("REDCAP_LOADER_UPLOAD_RATE_LIMIT") {
        if let Ok(limit) = val.parse() {
            config.upload.rate_limit = limit;
        }
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_UPLOAD_RATE_PERIOD_SECONDS") {
        if let Ok(period) = val.parse() {
            config.upload.rate_period_seconds = period;
        }
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_UPLOAD_SKIP_BLANKS") {
        config.upload.skip_blanks = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_UPLOAD_BULK_SEND_BLANKS") {
        config.upload.bulk_send_blanks = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("REDCAP_LOADER_STATE_BACKEND") {
        match val.to_lowercase().as_str() {
            "file" => config.state.backend = StateBackend::File,
            "memory" => config.state.backend = StateBackend::Memory,
            other => tracing::warn!(backend = %other, "Ignoring unknown state backend override"),
        }
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_STATE_PATH") {
        config.state.path = val;
    }

    if let Ok(val) = std::env::var("REDCAP_LOADER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("REDCAP_LOADER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
