//! REDCap API adapter
//!
//! - [`RecordSink`] - what the upload core needs from a record destination
//! - [`RedcapClient`] - the reqwest-backed implementation

pub mod client;
pub mod models;
pub mod traits;

pub use client::RedcapClient;
pub use traits::{ImportResponse, RecordSink};
