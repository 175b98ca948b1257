//! Sent-event state
//!
//! Remembers which form events were delivered so a rerun does not send them
//! again.

pub mod manager;
pub mod sent;

pub use manager::SentEventTracker;
pub use sent::{SentEventEntry, SentKey};
