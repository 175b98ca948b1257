//! Domain identifier types with validation
//!
//! Newtype wrappers for the names that identify study data. Each type keeps
//! subjects, forms and events from being mixed up and rejects blank values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject (study participant) identifier
///
/// Taken from the `study_id` element of a `person` node and used as the
/// REDCap record ID.
///
/// # Examples
///
/// ```
/// use redcap_loader::domain::ids::SubjectId;
/// use std::str::FromStr;
///
/// let subject_id = SubjectId::from_str("999-0001").unwrap();
/// assert_eq!(subject_id.as_str(), "999-0001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a new SubjectId from a string
    ///
    /// # Arguments
    ///
    /// * `id` - The subject identifier string
    ///
    /// # Returns
    ///
    /// Returns `Ok(SubjectId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Subject ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the subject ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// REDCap form (instrument) name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormName(String);

impl FormName {
    /// Creates a new FormName from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Form name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the form name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which sent events for this form are counted in the report
    ///
    /// ```
    /// use redcap_loader::domain::ids::FormName;
    ///
    /// let form = FormName::new("cbc").unwrap();
    /// assert_eq!(form.total_key(), "Total_cbc_Forms");
    /// ```
    pub fn total_key(&self) -> String {
        format!("Total_{}_Forms", self.0)
    }
}

impl fmt::Display for FormName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for FormName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// REDCap event name
///
/// In longitudinal projects this is the unique event name
/// (e.g. `1_arm_1`); the pair (subject, event) identifies a REDCap record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventName(String);

impl EventName {
    /// Creates a new EventName from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Event name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the event name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
