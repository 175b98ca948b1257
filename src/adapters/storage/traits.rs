//! Sent-event storage trait
//!
//! This module defines the interface that sent-event stores must implement.

use crate::core::state::sent::{SentEventEntry, SentKey};
use crate::domain::Result;
use async_trait::async_trait;

/// Storage for delivered (subject, form, event) triples
///
/// Implementations must give read-after-write consistency: once `insert`
/// returns, `contains` sees the key.
#[async_trait]
pub trait SentEventStorage: Send + Sync {
    /// Check whether a key has been stored
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn contains(&self, key: &SentKey) -> Result<bool>;

    /// Store an entry, replacing any previous entry for the same key
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    async fn insert(&self, entry: SentEventEntry) -> Result<()>;

    /// All stored entries, ordered by key
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn all_entries(&self) -> Result<Vec<SentEventEntry>>;

    /// Short name of the backend, for logs
    fn backend_name(&self) -> &'static str;
}
