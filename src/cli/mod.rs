//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the loader using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: finished, but REDCap rejected some records
pub const EXIT_RECORD_ERRORS: i32 = 1;
/// Exit code: configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: REDCap could not be reached or refused the token
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: run aborted
pub const EXIT_FATAL: i32 = 5;

/// redcap-loader - Upload study XML exports into REDCap
#[derive(Parser, Debug)]
#[command(name = "redcap-loader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "redcap-loader.toml",
        env = "REDCAP_LOADER_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REDCAP_LOADER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a study XML file to REDCap
    Upload(commands::upload::UploadArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show which form events were already sent
    Status(commands::status::StatusArgs),
}
