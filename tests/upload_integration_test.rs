//! Integration tests for the upload workflow
//!
//! These tests drive the coordinator end to end against an in-memory REDCap
//! fake and an in-memory sent-event store.

use async_trait::async_trait;
use redcap_loader::adapters::redcap::{ImportResponse, RecordSink};
use redcap_loader::adapters::storage::MemorySentEventStorage;
use redcap_loader::adapters::xml::XmlDocument;
use redcap_loader::core::state::{SentEventTracker, SentKey};
use redcap_loader::core::upload::{UploadCoordinator, UploadOptions};
use redcap_loader::domain::{
    EventName, FormName, LoaderError, RedcapError, SubjectId, UploadRecord,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// REDCap fake that records every import and replays scripted failures
#[derive(Default)]
struct FakeRedcap {
    imports: Mutex<Vec<Vec<UploadRecord>>>,
    failures: Mutex<VecDeque<Option<RedcapError>>>,
}

impl FakeRedcap {
    /// Script the outcome of the next calls; `None` means success
    fn with_outcomes(outcomes: Vec<Option<RedcapError>>) -> Self {
        Self {
            imports: Mutex::new(Vec::new()),
            failures: Mutex::new(outcomes.into()),
        }
    }

    fn imports(&self) -> Vec<Vec<UploadRecord>> {
        self.imports.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for FakeRedcap {
    async fn send_records(
        &self,
        records: &[UploadRecord],
        _overwrite: bool,
    ) -> Result<ImportResponse, RedcapError> {
        self.imports.lock().unwrap().push(records.to_vec());
        let outcome = self.failures.lock().unwrap().pop_front().flatten();
        match outcome {
            Some(error) => Err(error),
            None => Ok(ImportResponse::new(records.len())),
        }
    }

    fn def_field(&self) -> &str {
        "record_id"
    }
}

fn tracker() -> Arc<SentEventTracker> {
    Arc::new(SentEventTracker::new(Arc::new(MemorySentEventStorage::new())))
}

fn key(subject: &str, form: &str, event: &str) -> SentKey {
    SentKey::new(
        SubjectId::new(subject).unwrap(),
        FormName::new(form).unwrap(),
        EventName::new(event).unwrap(),
    )
}

fn rejection(body: &str) -> RedcapError {
    RedcapError::Rejected {
        status: 400,
        body: body.to_string(),
    }
}

const ONE_DATA_ONE_BLANK: &str = r#"
<study>
  <person lab_id="L-77">
    <study_id>999-0001</study_id>
    <all_form_events>
      <form>
        <name>cbc</name>
        <event>
          <name>1_arm_1</name>
          <field><name>wbc</name><value>4.5</value></field>
          <field><name>hgb</name><value>13.1</value></field>
        </event>
        <event>
          <name>2_arm_1</name>
          <field><name>wbc</name><value></value></field>
          <field><name>hgb</name></field>
        </event>
      </form>
    </all_form_events>
  </person>
</study>
"#;

#[tokio::test]
async fn test_end_to_end_data_and_blank_event() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let sink = Arc::new(FakeRedcap::default());
    let tracker = tracker();

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();

    let imports = sink.imports();
    assert_eq!(imports.len(), 2);
    assert_eq!(imports[0][0].fields.get("wbc"), Some("4.5"));
    assert_eq!(imports[1][0].fields.get("wbc"), Some(""));
    assert_eq!(imports[1][0].fields.get("hgb"), Some(""));
    assert_eq!(imports[1][0].fields.get("redcap_event_name"), Some("2_arm_1"));

    assert_eq!(report.total_subjects, 1);
    assert_eq!(report.subject_form_count("999-0001", "cbc"), Some(1));
    assert_eq!(report.form_count("cbc"), Some(1));
    assert_eq!(
        report.subject_details["999-0001"].lab_id.as_deref(),
        Some("L-77")
    );
    assert!(report.errors.is_empty());
    assert!(report.is_successful());

    assert!(tracker.was_sent(&key("999-0001", "cbc", "1_arm_1")).await.unwrap());
    assert!(tracker.was_sent(&key("999-0001", "cbc", "2_arm_1")).await.unwrap());
}

#[tokio::test]
async fn test_second_run_sends_nothing_and_counts_the_same() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let tracker = tracker();

    let first_sink = Arc::new(FakeRedcap::default());
    let first = UploadCoordinator::new(first_sink.clone(), tracker.clone(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();
    assert_eq!(first_sink.imports().len(), 2);

    let second_sink = Arc::new(FakeRedcap::default());
    let second =
        UploadCoordinator::new(second_sink.clone(), tracker.clone(), UploadOptions::default())
            .upload(doc.root())
            .await
            .unwrap();

    assert!(second_sink.imports().is_empty());
    assert_eq!(second.requests_sent, 0);
    assert_eq!(second.total_subjects, first.total_subjects);
    assert_eq!(second.form_details, first.form_details);
    assert_eq!(second.subject_details, first.subject_details);
    assert_eq!(second.errors, first.errors);
}

#[tokio::test]
async fn test_skip_blanks_abandons_form_at_first_blank() {
    let doc = XmlDocument::parse_str(
        r#"
<study>
  <person>
    <study_id>S1</study_id>
    <all_form_events>
      <form>
        <name>vitals</name>
        <event><name>E1</name><field><name>bp</name><value></value></field></event>
        <event><name>E2</name><field><name>bp</name><value>120</value></field></event>
        <event><name>E3</name><field><name>bp</name><value></value></field></event>
      </form>
      <form>
        <name>cbc</name>
        <event><name>E1</name><field><name>wbc</name><value>5</value></field></event>
      </form>
    </all_form_events>
  </person>
</study>
"#,
    )
    .unwrap();
    let sink = Arc::new(FakeRedcap::default());
    let tracker = tracker();
    let options = UploadOptions {
        skip_blanks: true,
        ..UploadOptions::default()
    };

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), options)
        .upload(doc.root())
        .await
        .unwrap();

    // Only the next form gets through
    let imports = sink.imports();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0][0].fields.get("wbc"), Some("5"));

    assert_eq!(report.subject_form_count("S1", "vitals"), Some(0));
    assert_eq!(report.form_count("vitals"), Some(0));
    assert_eq!(report.form_count("cbc"), Some(1));
    for event in ["E1", "E2", "E3"] {
        assert!(!tracker.was_sent(&key("S1", "vitals", event)).await.unwrap());
    }
}

const SHARED_BLANK_IDENTITY: &str = r#"
<study>
  <person>
    <study_id>S1</study_id>
    <all_form_events>
      <form>
        <name>cbc</name>
        <event><name>E1</name><field><name>wbc</name><value></value></field></event>
      </form>
      <form>
        <name>vitals</name>
        <event><name>E1</name><field><name>bp</name><value></value></field></event>
      </form>
    </all_form_events>
  </person>
</study>
"#;

#[tokio::test]
async fn test_bulk_blanks_merge_into_one_record() {
    let doc = XmlDocument::parse_str(SHARED_BLANK_IDENTITY).unwrap();
    let sink = Arc::new(FakeRedcap::default());
    let tracker = tracker();
    let options = UploadOptions {
        bulk_send_blanks: true,
        ..UploadOptions::default()
    };

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), options)
        .upload(doc.root())
        .await
        .unwrap();

    let imports = sink.imports();
    assert_eq!(imports.len(), 1, "blanks go out in one call at the end");
    assert_eq!(imports[0].len(), 1, "same subject and event merge");

    let merged = &imports[0][0].fields;
    assert_eq!(merged.get("record_id"), Some("S1"));
    assert_eq!(merged.get("redcap_event_name"), Some("E1"));
    assert_eq!(merged.get("wbc"), Some(""));
    assert_eq!(merged.get("bp"), Some(""));

    assert!(tracker.was_sent(&key("S1", "cbc", "E1")).await.unwrap());
    assert!(tracker.was_sent(&key("S1", "vitals", "E1")).await.unwrap());
    assert_eq!(report.requests_sent, 1);
    assert_eq!(report.form_count("cbc"), Some(0));
}

#[tokio::test]
async fn test_failed_bulk_call_marks_nothing() {
    let doc = XmlDocument::parse_str(SHARED_BLANK_IDENTITY).unwrap();
    let body = r#"{"error":"There were errors","records":[{"record":"S1","field_name":"bp","value":"","message":"Field is locked"}]}"#;
    let sink = Arc::new(FakeRedcap::with_outcomes(vec![Some(rejection(body))]));
    let tracker = tracker();
    let options = UploadOptions {
        bulk_send_blanks: true,
        ..UploadOptions::default()
    };

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), options)
        .upload(doc.root())
        .await
        .unwrap();

    assert_eq!(sink.imports().len(), 1);
    assert!(!tracker.was_sent(&key("S1", "cbc", "E1")).await.unwrap());
    assert!(!tracker.was_sent(&key("S1", "vitals", "E1")).await.unwrap());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Field is locked"));
}

#[tokio::test]
async fn test_rejected_event_does_not_stop_the_run() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let body = r#"{"error":"Invalid data","records":[{"record":"999-0001","field_name":"wbc","value":"4.5","message":"out of range"}]}"#;
    let sink = Arc::new(FakeRedcap::with_outcomes(vec![Some(rejection(body)), None]));
    let tracker = tracker();

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();

    assert_eq!(sink.imports().len(), 2);
    assert!(!tracker.was_sent(&key("999-0001", "cbc", "1_arm_1")).await.unwrap());
    assert!(tracker.was_sent(&key("999-0001", "cbc", "2_arm_1")).await.unwrap());

    assert_eq!(report.form_count("cbc"), Some(0));
    assert_eq!(report.errors.len(), 1);
    for part in ["999-0001", "wbc", "4.5", "out of range"] {
        assert!(report.errors[0].contains(part), "missing {part}");
    }
    assert!(!report.is_successful());
}

#[tokio::test]
async fn test_malformed_rejection_is_logged_not_reported() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let sink = Arc::new(FakeRedcap::with_outcomes(vec![Some(rejection(
        "<html>Bad Gateway</html>",
    ))]));

    let report = UploadCoordinator::new(sink.clone(), tracker(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();

    assert_eq!(sink.imports().len(), 2);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_transport_failure_aborts_the_run() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let sink = Arc::new(FakeRedcap::with_outcomes(vec![Some(RedcapError::Timeout(
        "no answer after 30s".to_string(),
    ))]));
    let tracker = tracker();

    let result = UploadCoordinator::new(sink.clone(), tracker.clone(), UploadOptions::default())
        .upload(doc.root())
        .await;

    assert!(matches!(
        result,
        Err(LoaderError::Redcap(RedcapError::Timeout(_)))
    ));
    assert_eq!(sink.imports().len(), 1, "nothing is sent after the failure");
    assert!(tracker.all_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nameless_field_anywhere_rejects_document() {
    let doc = XmlDocument::parse_str(
        r#"
<study>
  <person>
    <study_id>S1</study_id>
    <all_form_events>
      <form>
        <name>cbc</name>
        <event><name>E1</name><field><name>wbc</name><value>5</value></field></event>
      </form>
      <form>
        <name>vitals</name>
        <event><name>E1</name><field><value>120</value></field></event>
      </form>
    </all_form_events>
  </person>
</study>
"#,
    )
    .unwrap();
    let sink = Arc::new(FakeRedcap::default());

    let result = UploadCoordinator::new(sink.clone(), tracker(), UploadOptions::default())
        .upload(doc.root())
        .await;

    assert!(matches!(result, Err(LoaderError::Validation(_))));
    assert!(sink.imports().is_empty());
}

#[tokio::test]
async fn test_blank_event_name_is_validation_error() {
    let doc = XmlDocument::parse_str(
        r#"<study><person><study_id>S1</study_id><all_form_events>
             <form><name>cbc</name><event><name></name><field><name>wbc</name><value>5</value></field></event></form>
           </all_form_events></person></study>"#,
    )
    .unwrap();

    let result = UploadCoordinator::new(
        Arc::new(FakeRedcap::default()),
        tracker(),
        UploadOptions::default(),
    )
    .upload(doc.root())
    .await;

    assert!(matches!(result, Err(LoaderError::Validation(_))));
}

#[tokio::test]
async fn test_subjects_are_processed_in_document_order() {
    let doc = XmlDocument::parse_str(
        r#"
<study>
  <person><study_id>B</study_id><all_form_events>
    <form><name>cbc</name><event><name>E1</name><field><name>wbc</name><value>1</value></field></event></form>
  </all_form_events></person>
  <person><study_id>A</study_id><all_form_events>
    <form><name>cbc</name><event><name>E1</name><field><name>wbc</name><value>2</value></field></event></form>
  </all_form_events></person>
</study>
"#,
    )
    .unwrap();
    let sink = Arc::new(FakeRedcap::default());

    let report = UploadCoordinator::new(sink.clone(), tracker(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();

    let order: Vec<String> = sink
        .imports()
        .iter()
        .map(|call| call[0].identity.subject_id.to_string())
        .collect();
    assert_eq!(order, vec!["B", "A"]);
    assert_eq!(report.total_subjects, 2);
    assert_eq!(report.form_count("cbc"), Some(2));
}

#[tokio::test]
async fn test_skip_blanks_wins_when_bulk_is_also_set() {
    let doc = XmlDocument::parse_str(
        r#"
<study>
  <person>
    <study_id>S1</study_id>
    <all_form_events>
      <form>
        <name>vitals</name>
        <event><name>E1</name><field><name>bp</name><value></value></field></event>
        <event><name>E2</name><field><name>bp</name><value>120</value></field></event>
      </form>
    </all_form_events>
  </person>
</study>
"#,
    )
    .unwrap();
    let sink = Arc::new(FakeRedcap::default());
    let tracker = tracker();
    let options = UploadOptions {
        skip_blanks: true,
        bulk_send_blanks: true,
        ..UploadOptions::default()
    };

    let report = UploadCoordinator::new(sink.clone(), tracker.clone(), options)
        .upload(doc.root())
        .await
        .unwrap();

    // No single send and no bulk call at the end
    assert!(sink.imports().is_empty());
    assert_eq!(report.requests_sent, 0);
    assert_eq!(report.form_count("vitals"), Some(0));
    assert!(tracker.all_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejection_with_unreadable_entry_keeps_earlier_errors() {
    let doc = XmlDocument::parse_str(ONE_DATA_ONE_BLANK).unwrap();
    let body = r#"{"error":"Invalid data","records":[
        {"record":"999-0001","field_name":"wbc","value":"4.5","message":"out of range"},
        {"record":"999-0001"}
    ]}"#;
    let sink = Arc::new(FakeRedcap::with_outcomes(vec![Some(rejection(body))]));

    let report = UploadCoordinator::new(sink.clone(), tracker(), UploadOptions::default())
        .upload(doc.root())
        .await
        .unwrap();

    assert_eq!(sink.imports().len(), 2);
    assert_eq!(
        report.errors,
        vec![
            "Error writing to record 999-0001 field wbc Value 4.5. Error Message: out of range"
                .to_string()
        ]
    );
}
