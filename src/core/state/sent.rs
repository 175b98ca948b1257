//! Sent-event model
//!
//! Tracks which (subject, form, event) triples have already been delivered
//! to REDCap. This is finer grained than a REDCap record on purpose: several
//! forms feed the same record, and each one is remembered separately.

use crate::domain::ids::{EventName, FormName, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one delivered form event
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SentKey {
    /// Subject the event belongs to
    pub subject_id: SubjectId,

    /// Form the event belongs to
    pub form_name: FormName,

    /// Event name
    pub event_name: EventName,
}

impl SentKey {
    /// Create a new key
    pub fn new(subject_id: SubjectId, form_name: FormName, event_name: EventName) -> Self {
        Self {
            subject_id,
            form_name,
            event_name,
        }
    }
}

impl fmt::Display for SentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subject_id, self.form_name, self.event_name
        )
    }
}

/// Stored record of a delivered form event
///
/// # Examples
///
/// ```
/// use redcap_loader::core::state::{SentEventEntry, SentKey};
/// use redcap_loader::domain::{EventName, FormName, SubjectId};
///
/// let key = SentKey::new(
///     SubjectId::new("999-0001").unwrap(),
///     FormName::new("cbc").unwrap(),
///     EventName::new("1_arm_1").unwrap(),
/// );
/// let entry = SentEventEntry::now(key.clone());
/// assert_eq!(entry.key, key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEventEntry {
    /// Which event was sent
    #[serde(flatten)]
    pub key: SentKey,

    /// When it was marked as sent
    pub marked_at: DateTime<Utc>,
}

impl SentEventEntry {
    /// Entry stamped with the current time
    pub fn now(key: SentKey) -> Self {
        Self {
            key,
            marked_at: Utc::now(),
        }
    }
}
