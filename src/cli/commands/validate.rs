//! Validate config command implementation
//!
//! This module implements the `validate-config` command.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, StateBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// `load_config` already validates, so a successful load means the file
    /// is usable.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is not valid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  REDCap API: {}", config.redcap.api_url);
        println!(
            "  Record ID Field: {}",
            config
                .redcap
                .def_field
                .as_deref()
                .unwrap_or("(from project metadata)")
        );
        println!(
            "  Rate Limit: {} calls / {}s",
            config.upload.rate_limit, config.upload.rate_period_seconds
        );
        println!("  Skip Blanks: {}", config.upload.skip_blanks);
        println!("  Bulk Send Blanks: {}", config.upload.bulk_send_blanks);
        match config.state.backend {
            StateBackend::File => println!("  Sent Events: file {}", config.state.path),
            StateBackend::Memory => println!("  Sent Events: memory (not persisted)"),
        }
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();

        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let code = ValidateArgs {}
            .execute("/nonexistent/redcap-loader.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[redcap]
api_url = "https://redcap.example.org/api/"
token = "abc"
"#,
        )
        .unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }
}
