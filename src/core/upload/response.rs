//! Parsing of REDCap import error responses
//!
//! A rejected import comes back as
//!
//! ```json
//! {"error": "...", "records": [
//!     {"record": "999-0001", "field_name": "wbc", "value": "x", "message": "..."}
//! ]}
//! ```
//!
//! Each entry becomes one line in the report. A body of any other shape is
//! logged and otherwise ignored; it must never stop the upload.

use super::report::UploadReport;
use serde::Deserialize;

/// One record REDCap refused
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordError {
    pub record: String,
    pub field_name: String,
    pub value: String,
    pub message: String,
}

impl RecordError {
    /// Human-readable report line
    pub fn to_report_line(&self) -> String {
        format!(
            "Error writing to record {} field {} Value {}. Error Message: {}",
            self.record, self.field_name, self.value, self.message
        )
    }
}

/// Outcome of interpreting an error body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// Well-formed per-record error list (possibly empty)
    RecordErrors(Vec<RecordError>),
    /// Entries before the first one that could not be read
    Truncated {
        errors: Vec<RecordError>,
        reason: String,
    },
    /// Anything else, with the reason it was not understood
    Malformed(String),
}

/// Interpret an error body
///
/// Entries are read in order. Reading stops at the first entry lacking one of
/// its keys; the entries before it are kept.
pub fn parse_error_response(body: &str) -> ParsedResponse {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return ParsedResponse::Malformed(format!("not JSON: {e}")),
    };

    if value.get("error").is_none() {
        return ParsedResponse::Malformed("REDCap response is in unknown format".to_string());
    }

    let entries = match value.get("records").and_then(|r| r.as_array()) {
        Some(entries) => entries,
        None => return ParsedResponse::Malformed("missing records list".to_string()),
    };

    let mut errors = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match RecordError::deserialize(entry) {
            Ok(error) => errors.push(error),
            Err(e) => {
                return ParsedResponse::Truncated {
                    errors,
                    reason: format!("records[{index}]: {e}"),
                }
            }
        }
    }

    ParsedResponse::RecordErrors(errors)
}

/// Add one report line per refused record
///
/// Always returns `true`: the body was handled, whether or not it could be
/// understood. Only the logs tell the two apart.
pub fn record_errors(body: &str, report: &mut UploadReport) -> bool {
    tracing::debug!("Handling error response from REDCap");

    match parse_error_response(body) {
        ParsedResponse::RecordErrors(errors) => push_lines(errors, report),
        ParsedResponse::Truncated { errors, reason } => {
            push_lines(errors, report);
            tracing::error!(reason = %reason, body = %body, "REDCap error response has an unreadable entry; later entries were dropped");
        }
        ParsedResponse::Malformed(reason) => {
            tracing::error!(reason = %reason, body = %body, "Could not interpret REDCap error response");
        }
    }

    true
}

fn push_lines(errors: Vec<RecordError>, report: &mut UploadReport) {
    for error in errors {
        let line = error.to_report_line();
        tracing::info!(
            record = %error.record,
            field = %error.field_name,
            "{line}"
        );
        report.add_error(line);
    }
}
