//! Status command implementation
//!
//! This module implements the `status` command, which shows how many form
//! events the configured store remembers as sent.

use crate::adapters::storage::create_sent_event_storage;
use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::config::{load_config, StateBackend};
use crate::core::state::SentEventTracker;
use clap::Args;
use std::collections::{BTreeMap, BTreeSet};

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only count events of this subject
    #[arg(long)]
    pub subject: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sent-event status");

        println!("📊 Upload Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(EXIT_CONFIG);
            }
        };

        if config.state.backend == StateBackend::Memory {
            println!("Sent events are kept in memory only; nothing is recorded between runs.");
            return Ok(EXIT_OK);
        }

        let storage = match create_sent_event_storage(&config.state).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open sent-event store");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };
        let tracker = SentEventTracker::new(storage);

        let entries = match tracker.all_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                println!("❌ Failed to read sent events");
                println!("   Error: {}", e);
                return Ok(EXIT_FATAL);
            }
        };

        let mut by_form: BTreeMap<&str, usize> = BTreeMap::new();
        let mut subjects = BTreeSet::new();
        for entry in entries
            .iter()
            .filter(|e| {
                self.subject
                    .as_deref()
                    .map_or(true, |s| e.key.subject_id.as_str() == s)
            })
        {
            *by_form.entry(entry.key.form_name.as_str()).or_insert(0) += 1;
            subjects.insert(entry.key.subject_id.as_str());
        }

        if by_form.is_empty() {
            println!("No sent events found in {}.", config.state.path);
            println!("Run 'redcap-loader upload --input <file>' to start uploading data.");
            return Ok(EXIT_OK);
        }

        println!(
            "{} subject(s), {} form event(s) sent:",
            subjects.len(),
            by_form.values().sum::<usize>()
        );
        println!();
        println!("{:<40} {:>10}", "Form", "Events");
        println!("{}", "-".repeat(51));
        for (form, count) in &by_form {
            println!("{:<40} {:>10}", form, count);
        }
        println!();

        Ok(EXIT_OK)
    }
}
