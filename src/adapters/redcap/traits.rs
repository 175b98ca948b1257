//! Record sink abstraction
//!
//! This module defines the trait the upload core uses to deliver records.
//! The REDCap client implements it for real, the throttle decorates it, and
//! tests implement it with in-memory fakes.

use crate::domain::{RedcapError, UploadRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a successful record import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportResponse {
    /// Number of records the server reports as written
    pub count: usize,
}

impl ImportResponse {
    /// Create a response with the given write count
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

/// Destination for upload records
///
/// A failed import is reported as a [`RedcapError`]. When the server
/// rejected the data itself the error is `RedcapError::Rejected` and carries
/// the raw response body.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Import a batch of records
    ///
    /// # Arguments
    ///
    /// * `records` - Records to import, one flat field mapping each
    /// * `overwrite` - Replace existing values with blanks instead of keeping them
    ///
    /// # Errors
    ///
    /// Returns an error if the import fails or the server rejects it.
    async fn send_records(
        &self,
        records: &[UploadRecord],
        overwrite: bool,
    ) -> Result<ImportResponse, RedcapError>;

    /// Name of the field that identifies a subject in every record
    fn def_field(&self) -> &str;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    async fn send_records(
        &self,
        records: &[UploadRecord],
        overwrite: bool,
    ) -> Result<ImportResponse, RedcapError> {
        (**self).send_records(records, overwrite).await
    }

    fn def_field(&self) -> &str {
        (**self).def_field()
    }
}
