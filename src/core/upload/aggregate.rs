//! Merging of form mappings into REDCap records
//!
//! REDCap stores records, not forms. Every form event for the same subject
//! and event name ends up in one record, so before a bulk import the field
//! mappings sharing a [`SubjectIdentity`] are merged.

use crate::domain::{FieldMapping, SubjectIdentity, UploadRecord};
use std::collections::HashMap;

/// Merge mappings into one record per identity
///
/// Later mappings overwrite same-named fields of earlier ones with the same
/// identity. Records come back in the order their identity was first seen.
pub fn merge_records<'a, I>(mappings: I) -> Vec<UploadRecord>
where
    I: IntoIterator<Item = (&'a SubjectIdentity, &'a FieldMapping)>,
{
    let mut records: Vec<UploadRecord> = Vec::new();
    let mut index: HashMap<&'a SubjectIdentity, usize> = HashMap::new();

    for (identity, fields) in mappings {
        match index.get(identity) {
            Some(&position) => records[position].fields.merge_from(fields),
            None => {
                index.insert(identity, records.len());
                records.push(UploadRecord::new(identity.clone(), fields.clone()));
            }
        }
    }

    records
}
