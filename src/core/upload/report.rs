//! Upload report
//!
//! Counters and error messages collected over one upload run.

use crate::domain::{FormName, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-subject details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDetails {
    /// `lab_id` attribute of the subject, when present
    pub lab_id: Option<String>,

    /// Delivered data-bearing events per form, keyed `Total_<form>_Forms`
    pub forms: BTreeMap<String, u64>,
}

/// Result of an upload run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    /// Number of `person` elements processed
    pub total_subjects: usize,

    /// Delivered data-bearing events per form across all subjects
    pub form_details: BTreeMap<String, u64>,

    /// Per-subject counters
    pub subject_details: BTreeMap<String, SubjectDetails>,

    /// One message per record REDCap refused, in the order they were reported
    pub errors: Vec<String>,

    /// Number of import requests sent
    pub requests_sent: usize,

    /// Wall time of the run
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl UploadReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Register a subject the first time it is seen
    ///
    /// Returns `true` if the subject was new.
    pub fn register_subject(&mut self, subject_id: &SubjectId, lab_id: Option<&str>) -> bool {
        if self.subject_details.contains_key(subject_id.as_str()) {
            return false;
        }
        self.subject_details.insert(
            subject_id.as_str().to_string(),
            SubjectDetails {
                lab_id: lab_id.map(str::to_string),
                forms: BTreeMap::new(),
            },
        );
        true
    }

    /// Make sure the subject and global counters for a form exist
    pub fn register_form(&mut self, subject_id: &SubjectId, form: &FormName) {
        let key = form.total_key();
        self.subject_details
            .entry(subject_id.as_str().to_string())
            .or_default()
            .forms
            .entry(key.clone())
            .or_insert(0);
        self.form_details.entry(key).or_insert(0);
    }

    /// Count one delivered data-bearing event
    pub fn count_delivered(&mut self, subject_id: &SubjectId, form: &FormName) {
        let key = form.total_key();
        *self
            .subject_details
            .entry(subject_id.as_str().to_string())
            .or_default()
            .forms
            .entry(key.clone())
            .or_insert(0) += 1;
        *self.form_details.entry(key).or_insert(0) += 1;
    }

    /// Append an error message
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Counter of a form for one subject
    pub fn subject_form_count(&self, subject_id: &str, form: &str) -> Option<u64> {
        self.subject_details
            .get(subject_id)
            .and_then(|details| details.forms.get(&format!("Total_{form}_Forms")))
            .copied()
    }

    /// Global counter of a form
    pub fn form_count(&self, form: &str) -> Option<u64> {
        self.form_details.get(&format!("Total_{form}_Forms")).copied()
    }

    /// Check if REDCap refused nothing
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_subjects = self.total_subjects,
            forms = self.form_details.len(),
            requests_sent = self.requests_sent,
            errors = self.errors.len(),
            duration_secs = self.duration.as_secs(),
            "Upload completed"
        );

        for (form, count) in &self.form_details {
            tracing::info!(form = %form, count, "Form events delivered");
        }

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Upload completed with errors");
            for error in &self.errors {
                tracing::warn!(message = %error, "Upload error");
            }
        }

        tracing::debug!(report = ?self, "Upload report");
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
