//! Upload command implementation
//!
//! This module implements the `upload` command: read a study XML export and
//! import it into the configured REDCap project.

use crate::adapters::redcap::RedcapClient;
use crate::adapters::storage::create_sent_event_storage;
use crate::adapters::xml::XmlDocument;
use crate::cli::{EXIT_CONFIG, EXIT_CONNECTION, EXIT_FATAL, EXIT_OK, EXIT_RECORD_ERRORS};
use crate::config::{load_config, LoaderConfig};
use crate::core::state::SentEventTracker;
use crate::core::upload::{UploadCoordinator, UploadOptions, UploadReport};
use crate::domain::LoaderError;
use crate::log_error_with_context;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Study XML export to upload
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the upload report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Abandon the rest of a form at its first blank event
    #[arg(long)]
    pub skip_blanks: bool,

    /// Defer blank events and send them merged in one call at the end
    #[arg(long)]
    pub bulk_send_blanks: bool,

    /// Override the maximum number of REDCap calls per rate period
    #[arg(long)]
    pub rate_limit: Option<u32>,
}

impl UploadArgs {
    /// Apply CLI overrides to a loaded configuration
    pub fn apply_overrides(&self, config: &mut LoaderConfig) {
        if self.skip_blanks {
            tracing::info!("Enabling skip_blanks from CLI");
            config.upload.skip_blanks = true;
        }
        if self.bulk_send_blanks {
            tracing::info!("Enabling bulk_send_blanks from CLI");
            config.upload.bulk_send_blanks = true;
        }
        if let Some(rate_limit) = self.rate_limit {
            tracing::info!(rate_limit, "Overriding rate limit from CLI");
            config.upload.rate_limit = rate_limit;
        }
    }

    /// Execute the upload command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting upload command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let document = match XmlDocument::from_file(&self.input) {
            Ok(d) => d,
            Err(e) => {
                log_error_with_context!(&e, "Failed to read input document");
                eprintln!("Failed to read {}: {e}", self.input.display());
                return Ok(EXIT_FATAL);
            }
        };

        let client = match RedcapClient::connect(&config.redcap).await {
            Ok(c) => Arc::new(c),
            Err(e) => {
                log_error_with_context!(&e, "Failed to connect to REDCap");
                eprintln!("Failed to connect to REDCap: {e}");
                return Ok(EXIT_CONNECTION);
            }
        };

        let storage = match create_sent_event_storage(&config.state).await {
            Ok(s) => s,
            Err(e) => {
                log_error_with_context!(&e, "Failed to open sent-event store");
                eprintln!("Failed to open sent-event store: {e}");
                return Ok(EXIT_FATAL);
            }
        };
        let tracker = Arc::new(SentEventTracker::new(storage));

        let coordinator = UploadCoordinator::new(
            client,
            tracker,
            UploadOptions::from_config(&config.upload),
        );

        println!("🚀 Uploading {} ...", self.input.display());
        println!();

        let report = match coordinator.upload(document.root()).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                eprintln!("Upload failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        report.log_summary();
        print_summary(&report);

        if let Some(path) = &self.report {
            write_report(&report, path)?;
            println!("Report written to {}", path.display());
        }

        if report.is_successful() {
            println!("✅ Upload completed successfully!");
            Ok(EXIT_OK)
        } else {
            println!("⚠️  Upload completed with errors");
            Ok(EXIT_RECORD_ERRORS)
        }
    }
}

/// Exit code for an upload that aborted
fn exit_code_for(error: &LoaderError) -> i32 {
    match error {
        LoaderError::Redcap(_) => EXIT_CONNECTION,
        LoaderError::Configuration(_) => EXIT_CONFIG,
        _ => EXIT_FATAL,
    }
}

fn print_summary(report: &UploadReport) {
    println!();
    println!("📊 Upload Summary:");
    println!("  Total Subjects: {}", report.total_subjects);
    println!("  Requests Sent: {}", report.requests_sent);
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    for (form, count) in &report.form_details {
        println!("  {form}: {count}");
    }
    println!();

    if !report.errors.is_empty() {
        println!("⚠️  Errors reported by REDCap:");
        for error in &report.errors {
            println!("  - {error}");
        }
        println!();
    }
}

fn write_report(report: &UploadReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::config::{
        ApplicationConfig, LoggingConfig, RedcapConfig, StateConfig, UploadConfig,
    };
    use crate::domain::RedcapError;
    use tempfile::TempDir;

    fn args() -> UploadArgs {
        UploadArgs {
            input: PathBuf::from("study.xml"),
            report: None,
            skip_blanks: false,
            bulk_send_blanks: false,
            rate_limit: None,
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            application: ApplicationConfig::default(),
            redcap: RedcapConfig {
                api_url: "https://redcap.example.org/api/".to_string(),
                token: secret_string("abc".to_string()),
                def_field: None,
                timeout_seconds: 30,
                tls_verify: true,
            },
            upload: UploadConfig::default(),
            state: StateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_overrides_only_enable() {
        let mut config = config();
        config.upload.skip_blanks = true;

        args().apply_overrides(&mut config);
        assert!(config.upload.skip_blanks);
        assert_eq!(config.upload.rate_limit, 600);

        let mut overriding = args();
        overriding.bulk_send_blanks = true;
        overriding.rate_limit = Some(5);
        let mut config = self::config();
        overriding.apply_overrides(&mut config);
        assert!(config.upload.bulk_send_blanks);
        assert_eq!(config.upload.rate_limit, 5);
    }

    #[test]
    fn test_conflicting_overrides_fail_validation() {
        let mut both = args();
        both.skip_blanks = true;
        both.bulk_send_blanks = true;

        let mut config = config();
        both.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&LoaderError::Redcap(RedcapError::Timeout("t".into()))),
            EXIT_CONNECTION
        );
        assert_eq!(
            exit_code_for(&LoaderError::Validation("v".into())),
            EXIT_FATAL
        );
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = UploadReport::new();
        report.total_subjects = 3;

        write_report(&report, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["total_subjects"], 3);
    }
}
