//! Form event transformation
//!
//! Turns one `event` element into the flat field mapping REDCap imports.

use crate::adapters::xml::TreeNode;
use crate::domain::{EventName, FieldMapping, LoaderError, Result, EVENT_NAME_FIELD};
use std::sync::OnceLock;

/// Output of transforming one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedEvent {
    /// Name of the event
    pub event_name: EventName,

    /// Complete record payload
    pub fields: FieldMapping,

    /// At least one field carries a non-empty value
    pub contains_data: bool,
}

impl TransformedEvent {
    /// No field carries a value
    pub fn is_blank(&self) -> bool {
        !self.contains_data
    }
}

/// Transforms event elements of one document
///
/// Every field of every event in the document must have a non-blank name,
/// not only the fields of the event being transformed. That check runs once,
/// on the first transform, and its outcome is reused afterwards.
pub struct EventTransformer<'doc, N: TreeNode> {
    document: &'doc N,
    field_names: OnceLock<std::result::Result<(), String>>,
}

impl<'doc, N: TreeNode> EventTransformer<'doc, N> {
    /// Create a transformer for the document rooted at `document`
    pub fn new(document: &'doc N) -> Self {
        Self {
            document,
            field_names: OnceLock::new(),
        }
    }

    /// Transform one event into a record payload
    ///
    /// `mapping` must already hold the record ID field. The event name is
    /// added under `redcap_event_name` and every field of the event is copied
    /// in, with a missing `value` becoming an empty string.
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::Validation` if the event name is missing or
    /// blank, or if any field anywhere in the document has a missing or blank
    /// name.
    pub fn transform(&self, event: &N, mut mapping: FieldMapping) -> Result<TransformedEvent> {
        let event_name = event
            .child_text("name")
            .and_then(|name| EventName::new(name).ok())
            .ok_or_else(|| {
                LoaderError::Validation("Expected non-blank element event/name".to_string())
            })?;

        self.check_field_names()?;

        mapping.insert(EVENT_NAME_FIELD, event_name.as_str());

        let mut contains_data = false;
        for field in event.children_named("field") {
            let name = field.child_text("name").unwrap_or_default();
            let value = field.child_text("value").unwrap_or_default();
            if !value.is_empty() {
                contains_data = true;
            }
            mapping.insert(name, value);
        }

        Ok(TransformedEvent {
            event_name,
            fields: mapping,
            contains_data,
        })
    }

    fn check_field_names(&self) -> Result<()> {
        self.field_names
            .get_or_init(|| {
                let mut events = self.document.descendants_named("event");
                if self.document.name() == "event" {
                    events.insert(0, self.document);
                }

                let unnamed = events
                    .into_iter()
                    .flat_map(|event| event.children_named("field"))
                    .any(|field| {
                        field
                            .child_text("name")
                            .map_or(true, |name| name.trim().is_empty())
                    });

                if unnamed {
                    Err("Expected non-blank element event/field/name".to_string())
                } else {
                    Ok(())
                }
            })
            .clone()
            .map_err(LoaderError::Validation)
    }
}
