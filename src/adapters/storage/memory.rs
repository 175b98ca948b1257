//! In-memory sent-event store
//!
//! Nothing survives the process. Useful for dry runs against a test project
//! and in tests.

use super::traits::SentEventStorage;
use crate::core::state::sent::{SentEventEntry, SentKey};
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Sent-event store backed by a map in process memory
#[derive(Debug, Default)]
pub struct MemorySentEventStorage {
    entries: RwLock<BTreeMap<SentKey, SentEventEntry>>,
}

impl MemorySentEventStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries(entries: impl IntoIterator<Item = SentEventEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

#[async_trait]
impl SentEventStorage for MemorySentEventStorage {
    async fn contains(&self, key: &SentKey) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn insert(&self, entry: SentEventEntry) -> Result<()> {
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn all_entries(&self) -> Result<Vec<SentEventEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
