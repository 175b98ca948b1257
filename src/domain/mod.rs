//! Domain models and types for the loader.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SubjectId`], [`FormName`], [`EventName`])
//! - **Record model** ([`FieldMapping`], [`SubjectIdentity`], [`UploadRecord`])
//! - **Error types** ([`LoaderError`], [`RedcapError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a form name can't be passed where a
//! subject ID is expected:
//!
//! ```rust
//! use redcap_loader::domain::{EventName, SubjectId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let subject_id = SubjectId::new("999-0001")?;
//! let event_name = EventName::new("1_arm_1")?;
//!
//! // let wrong: SubjectId = event_name;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::{LoaderError, RedcapError};
pub use ids::{EventName, FormName, SubjectId};
pub use record::{FieldMapping, SubjectIdentity, UploadRecord, EVENT_NAME_FIELD};
pub use result::Result;
