//! Core business logic for the loader.
//!
//! # Modules
//!
//! - [`upload`] - Subject/form/event walk, throttling, blank merging and reporting
//! - [`state`] - Tracking of form events already delivered to REDCap
//!
//! # Upload Workflow
//!
//! 1. **Walk**: visit every `person`, then its forms, then each form's events
//! 2. **Transform**: turn the event into a flat REDCap record
//! 3. **Decide**: skip already-sent events, abandon or defer blank ones
//! 4. **Send**: import the record through the throttled client
//! 5. **Mark**: remember the (subject, form, event) as sent
//! 6. **Bulk**: merge deferred blanks per (subject, event) and import them at once
//! 7. **Report**: return counters and REDCap's per-record errors
//!
//! # Example
//!
//! ```rust,no_run
//! use redcap_loader::adapters::redcap::RedcapClient;
//! use redcap_loader::adapters::storage::create_sent_event_storage;
//! use redcap_loader::adapters::xml::XmlDocument;
//! use redcap_loader::config::load_config;
//! use redcap_loader::core::state::SentEventTracker;
//! use redcap_loader::core::upload::{UploadCoordinator, UploadOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("redcap-loader.toml")?;
//! let client = Arc::new(RedcapClient::connect(&config.redcap).await?);
//! let storage = create_sent_event_storage(&config.state).await?;
//! let tracker = Arc::new(SentEventTracker::new(storage));
//!
//! let coordinator =
//!     UploadCoordinator::new(client, tracker, UploadOptions::from_config(&config.upload));
//!
//! let document = XmlDocument::from_file("study.xml")?;
//! let report = coordinator.upload(document.root()).await?;
//!
//! println!("Subjects: {}", report.total_subjects);
//! println!("Errors: {}", report.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod state;
pub mod upload;
