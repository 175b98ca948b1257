// redcap-loader - Study XML to REDCap upload tool
// Copyright (c) 2025 redcap-loader Contributors
// Licensed under the MIT License

//! # redcap-loader - Study XML to REDCap
//!
//! redcap-loader reads a clinical study export (subjects, their forms, each
//! form's events and each event's fields) and imports it into a REDCap project
//! through the REDCap API.
//!
//! ## Overview
//!
//! This library provides:
//! - **Transforming** each form event into a flat REDCap record
//! - **Deduplicating** form events already delivered in earlier runs
//! - **Rate limiting** calls to the REDCap API
//! - **Merging** blank form events per subject and event for one bulk import
//! - **Reporting** per-subject and per-form counters plus REDCap's per-record errors
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (upload workflow, sent-event state)
//! - [`adapters`] - External integrations (XML input, REDCap API, state storage)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
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
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("redcap-loader.toml")?;
//!
//!     let client = Arc::new(RedcapClient::connect(&config.redcap).await?);
//!     let tracker = Arc::new(SentEventTracker::new(
//!         create_sent_event_storage(&config.state).await?,
//!     ));
//!     let coordinator =
//!         UploadCoordinator::new(client, tracker, UploadOptions::from_config(&config.upload));
//!
//!     let document = XmlDocument::from_file("study.xml")?;
//!     let report = coordinator.upload(document.root()).await?;
//!
//!     println!("Uploaded {} subjects", report.total_subjects);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Everything returns [`domain::LoaderError`]. REDCap rejecting a record is
//! not an error of the run: it ends up in [`core::upload::UploadReport::errors`]
//! and the upload continues.
//!
//! ## Logging
//!
//! The loader logs with `tracing`; see [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
