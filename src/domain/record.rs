//! Upload record model
//!
//! REDCap only knows about records. A record is keyed by the subject ID and,
//! in longitudinal projects, the event name. The loader builds one
//! [`FieldMapping`] per form event and tags it with a [`SubjectIdentity`]
//! to get an [`UploadRecord`].

use super::ids::{EventName, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name used by REDCap to carry the event of a longitudinal record
pub const EVENT_NAME_FIELD: &str = "redcap_event_name";

/// Flat field-name to value mapping for one record
///
/// Serializes as a plain JSON object, which is the `flat` record format the
/// REDCap import API expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<String, String>);

impl FieldMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Create a mapping seeded with the project's record ID field
    pub fn seeded(def_field: &str, subject_id: &SubjectId) -> Self {
        let mut mapping = Self::new();
        mapping.insert(def_field, subject_id.as_str());
        mapping
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Copy every field of `other` into this mapping; `other` wins on collision
    pub fn merge_from(&mut self, other: &FieldMapping) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (name, value) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Natural key of a REDCap record: (subject, event)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectIdentity {
    /// Subject (record) ID
    pub subject_id: SubjectId,

    /// Event the record belongs to
    pub event_name: EventName,
}

impl SubjectIdentity {
    /// Create a new identity
    pub fn new(subject_id: SubjectId, event_name: EventName) -> Self {
        Self {
            subject_id,
            event_name,
        }
    }
}

/// A field mapping tagged with the record it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// Record identity
    pub identity: SubjectIdentity,

    /// Record payload, including the record ID and event fields
    pub fields: FieldMapping,
}

impl UploadRecord {
    /// Create a new upload record
    pub fn new(identity: SubjectIdentity, fields: FieldMapping) -> Self {
        Self { identity, fields }
    }
}
