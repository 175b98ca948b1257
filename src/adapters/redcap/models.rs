//! REDCap API wire models

use serde::Deserialize;

/// Body of a successful record import with `returnContent=count`
///
/// Older REDCap versions send the count as a string.
#[derive(Debug, Deserialize)]
pub struct ImportCountBody {
    pub count: CountValue,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CountValue {
    Number(usize),
    Text(String),
}

impl CountValue {
    /// Numeric value of the count, if it is one
    pub fn value(&self) -> Option<usize> {
        match self {
            CountValue::Number(n) => Some(*n),
            CountValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One entry of the project data dictionary (`content=metadata`)
///
/// Only the columns the loader uses are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataField {
    pub field_name: String,
    #[serde(default)]
    pub form_name: String,
}
