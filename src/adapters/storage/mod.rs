//! Sent-event storage backends

pub mod factory;
pub mod json_file;
pub mod memory;
pub mod traits;

pub use factory::create_sent_event_storage;
pub use json_file::JsonFileSentEventStorage;
pub use memory::MemorySentEventStorage;
pub use traits::SentEventStorage;
