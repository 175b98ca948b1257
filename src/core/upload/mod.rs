//! Upload workflow
//!
//! - [`event`] - one `event` element to one field mapping
//! - [`throttle`] - rate limiting around a record sink
//! - [`aggregate`] - merging blank form events into records
//! - [`response`] - REDCap error responses to report lines
//! - [`report`] - counters and errors of a run
//! - [`coordinator`] - the subject/form/event walk

pub mod aggregate;
pub mod coordinator;
pub mod event;
pub mod report;
pub mod response;
pub mod throttle;

pub use aggregate::merge_records;
pub use coordinator::{UploadCoordinator, UploadOptions};
pub use event::{EventTransformer, TransformedEvent};
pub use report::{SubjectDetails, UploadReport};
pub use response::{parse_error_response, record_errors, ParsedResponse, RecordError};
pub use throttle::Throttle;
