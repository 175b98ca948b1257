//! Sent-event storage factory
//!
//! Creates the configured sent-event store.

use super::json_file::JsonFileSentEventStorage;
use super::memory::MemorySentEventStorage;
use super::traits::SentEventStorage;
use crate::config::schema::{StateBackend, StateConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Create a sent-event store based on the configuration
///
/// # Errors
///
/// Returns an error if the file backend cannot load its existing file.
pub async fn create_sent_event_storage(config: &StateConfig) -> Result<Arc<dyn SentEventStorage>> {
    match config.backend {
        StateBackend::File => {
            tracing::info!(path = %config.path, "Using JSON Lines sent-event store");
            let storage = JsonFileSentEventStorage::open(&config.path).await?;
            Ok(Arc::new(storage) as Arc<dyn SentEventStorage>)
        }
        StateBackend::Memory => {
            tracing::info!("Using in-memory sent-event store");
            Ok(Arc::new(MemorySentEventStorage::new()) as Arc<dyn SentEventStorage>)
        }
    }
}
