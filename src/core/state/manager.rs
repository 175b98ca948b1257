//! Sent-event tracker
//!
//! This module provides the SentEventTracker the upload coordinator asks
//! "was this form event already delivered?" and tells "it is now".

use crate::adapters::storage::SentEventStorage;
use crate::core::state::sent::{SentEventEntry, SentKey};
use crate::domain::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tracker for delivered (subject, form, event) triples
///
/// Durability between runs is the storage backend's job. Within a run the
/// tracker relies on the backend's read-after-write consistency.
pub struct SentEventTracker {
    /// Sent-event storage backend
    storage: Arc<dyn SentEventStorage>,
}

impl SentEventTracker {
    /// Create a new tracker with a storage backend
    ///
    /// # Arguments
    ///
    /// * `storage` - Sent-event storage implementation
    pub fn new(storage: Arc<dyn SentEventStorage>) -> Self {
        Self { storage }
    }

    /// Check whether a form event was already delivered
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn was_sent(&self, key: &SentKey) -> Result<bool> {
        self.storage.contains(key).await
    }

    /// Remember that a form event was delivered
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot persist the entry.
    pub async fn mark_sent(&self, key: &SentKey) -> Result<()> {
        tracing::debug!(
            subject_id = %key.subject_id,
            form = %key.form_name,
            event = %key.event_name,
            "Marking form event as sent"
        );

        self.storage.insert(SentEventEntry::now(key.clone())).await
    }

    /// All delivered form events
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn all_entries(&self) -> Result<Vec<SentEventEntry>> {
        self.storage.all_entries().await
    }

    /// Number of delivered form events per form name
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn counts_by_form(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for entry in self.storage.all_entries().await? {
            *counts
                .entry(entry.key.form_name.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Short name of the storage backend
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }
}
