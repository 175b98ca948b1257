//! External system integrations for the loader.
//!
//! - [`xml`] - Study export parsing into a queryable element tree
//! - [`redcap`] - REDCap API client behind the [`redcap::RecordSink`] trait
//! - [`storage`] - Sent-event stores behind the [`storage::SentEventStorage`] trait
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind narrow traits so the upload
//! core can be tested against in-memory fakes.
//!
//! ```rust,no_run
//! use redcap_loader::adapters::redcap::RedcapClient;
//! use redcap_loader::config::{secret_string, RedcapConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RedcapConfig {
//!     api_url: "https://redcap.example.org/api/".to_string(),
//!     token: secret_string("0123456789ABCDEF".to_string()),
//!     def_field: Some("record_id".to_string()),
//!     timeout_seconds: 30,
//!     tls_verify: true,
//! };
//!
//! let client = RedcapClient::connect(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod redcap;
pub mod storage;
pub mod xml;
