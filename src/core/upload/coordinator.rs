//! Upload coordinator - main orchestrator for the upload process
//!
//! Walks subjects, forms and events of a study document in document order,
//! decides per event whether to skip it, send it or defer it as a blank, and
//! collects counters and REDCap errors into an [`UploadReport`].
//!
//! Processing is strictly sequential. The only suspension point besides the
//! network call is the throttle's wait when the call budget is used up.

use super::aggregate::merge_records;
use super::event::{EventTransformer, TransformedEvent};
use super::report::UploadReport;
use super::response::record_errors;
use super::throttle::Throttle;
use crate::adapters::redcap::RecordSink;
use crate::adapters::xml::TreeNode;
use crate::config::UploadConfig;
use crate::core::state::{SentEventTracker, SentKey};
use crate::domain::{
    FieldMapping, FormName, LoaderError, RedcapError, Result, SubjectId, SubjectIdentity,
    UploadRecord,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Progress is logged every this many requests per subject
const PROGRESS_INTERVAL: usize = 50;

/// Upload behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum number of import calls per `rate_period`
    pub rate_limit: u32,

    /// Length of the rate limiting window
    pub rate_period: Duration,

    /// Abandon the rest of a form at its first blank event
    pub skip_blanks: bool,

    /// Defer blank events and import them in one merged call at the end
    pub bulk_send_blanks: bool,
}

impl UploadOptions {
    /// Build options from the `[upload]` configuration section
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            rate_limit: config.rate_limit,
            rate_period: Duration::from_secs(config.rate_period_seconds),
            skip_blanks: config.skip_blanks,
            bulk_send_blanks: config.bulk_send_blanks,
        }
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

/// A blank form event waiting for the bulk import
struct DeferredBlank {
    key: SentKey,
    identity: SubjectIdentity,
    fields: FieldMapping,
}

/// Mutable state of one run
#[derive(Default)]
struct RunState {
    report: UploadReport,
    blanks: Vec<DeferredBlank>,
    /// Requests sent for the current subject
    subject_requests: usize,
}

/// Upload coordinator
pub struct UploadCoordinator {
    sink: Throttle<Arc<dyn RecordSink>>,
    tracker: Arc<SentEventTracker>,
    options: UploadOptions,
}

impl UploadCoordinator {
    /// Create a new upload coordinator
    ///
    /// The sink is wrapped in a [`Throttle`] built from the options.
    pub fn new(
        sink: Arc<dyn RecordSink>,
        tracker: Arc<SentEventTracker>,
        options: UploadOptions,
    ) -> Self {
        if options.skip_blanks && options.bulk_send_blanks {
            tracing::warn!(
                "Both skip_blanks and bulk_send_blanks are enabled; blank events will be skipped, not bulk sent"
            );
        }

        Self {
            sink: Throttle::new(sink, options.rate_limit, options.rate_period),
            tracker,
            options,
        }
    }

    /// Options in effect
    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Upload every `person` below `root`
    ///
    /// REDCap rejections are recorded in the report and do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::Validation` for a missing study_id, form name,
    /// event name or field name, and propagates any other failure (transport
    /// errors, sent-event storage errors). A run that returns an error is
    /// incomplete and its partial counters are unreliable.
    pub async fn upload<N: TreeNode>(&self, root: &N) -> Result<UploadReport> {
        let start_time = Instant::now();
        let mut run = RunState::default();
        let transformer = EventTransformer::new(root);
        let def_field = self.sink.def_field().to_string();

        tracing::info!(
            def_field = %def_field,
            skip_blanks = self.options.skip_blanks,
            bulk_send_blanks = self.options.bulk_send_blanks,
            rate_limit = self.options.rate_limit,
            "Starting upload"
        );

        for person in root.descendants_named("person") {
            run.report.total_subjects += 1;
            self.process_person(person, &transformer, &def_field, &mut run)
                .await?;
        }

        if !run.blanks.is_empty() {
            self.send_blanks(&mut run).await?;
        }

        let report = run.report.with_duration(start_time.elapsed());
        tracing::debug!(report = ?report, "Upload finished");
        Ok(report)
    }

    async fn process_person<N: TreeNode>(
        &self,
        person: &N,
        transformer: &EventTransformer<'_, N>,
        def_field: &str,
        run: &mut RunState,
    ) -> Result<()> {
        let person_start = Instant::now();

        let subject_id = person
            .child_text("study_id")
            .and_then(|text| SubjectId::new(text).ok())
            .ok_or_else(|| {
                LoaderError::Validation("Expected a valid value for study_id".to_string())
            })?;

        run.subject_requests = 0;
        tracing::info!(study_id = %subject_id, "Start sending data for subject");

        // Registered here rather than at the first form, so a subject
        // without forms still appears in the report
        run.report
            .register_subject(&subject_id, person.attribute("lab_id"));

        let forms = person
            .child("all_form_events")
            .map(|all| all.children_named("form"))
            .unwrap_or_default();

        for form in forms {
            let form_name = form
                .child_text("name")
                .and_then(|text| FormName::new(text).ok())
                .ok_or_else(|| {
                    LoaderError::Validation(format!(
                        "Expected non-blank element form/name for study_id {subject_id}"
                    ))
                })?;

            run.report.register_form(&subject_id, &form_name);
            tracing::debug!(study_id = %subject_id, form = %form_name, "Parsing form");

            for event in form.children_named("event") {
                let flow = self
                    .process_event(event, transformer, &subject_id, &form_name, def_field, run)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            study_id = %subject_id,
                            form = %form_name,
                            error = %e,
                            "Failed to process form event"
                        );
                        e
                    })?;

                if flow.is_break() {
                    tracing::debug!(
                        study_id = %subject_id,
                        form = %form_name,
                        "Blank event found, skipping the rest of the form"
                    );
                    break;
                }
            }
        }

        tracing::info!(
            study_id = %subject_id,
            elapsed_ms = person_start.elapsed().as_millis() as u64,
            requests_sent = run.subject_requests,
            "Finished subject"
        );

        Ok(())
    }

    /// Decide what to do with one event
    ///
    /// Breaks when the rest of the form should be abandoned.
    async fn process_event<N: TreeNode>(
        &self,
        event: &N,
        transformer: &EventTransformer<'_, N>,
        subject_id: &SubjectId,
        form_name: &FormName,
        def_field: &str,
        run: &mut RunState,
    ) -> Result<ControlFlow<()>> {
        let TransformedEvent {
            event_name,
            fields,
            contains_data,
        } = transformer.transform(event, FieldMapping::seeded(def_field, subject_id))?;

        let key = SentKey::new(subject_id.clone(), form_name.clone(), event_name.clone());

        if self.tracker.was_sent(&key).await? {
            tracing::debug!(event = %event_name, "Skipping previously sent event");
            if contains_data {
                run.report.count_delivered(subject_id, form_name);
            }
            return Ok(ControlFlow::Continue(()));
        }

        if !contains_data {
            if self.options.skip_blanks {
                return Ok(ControlFlow::Break(()));
            }

            if self.options.bulk_send_blanks {
                run.blanks.push(DeferredBlank {
                    key,
                    identity: SubjectIdentity::new(subject_id.clone(), event_name),
                    fields,
                });
                return Ok(ControlFlow::Continue(()));
            }
        }

        run.subject_requests += 1;
        run.report.requests_sent += 1;
        if run.subject_requests % PROGRESS_INTERVAL == 0 {
            tracing::info!(requests_sent = run.subject_requests, "Requests sent");
        }

        let record = UploadRecord::new(
            SubjectIdentity::new(subject_id.clone(), event_name.clone()),
            fields,
        );

        match self
            .sink
            .send_records(std::slice::from_ref(&record), true)
            .await
        {
            Ok(_) => {
                self.tracker.mark_sent(&key).await?;
                tracing::debug!(event = %event_name, "Sent event");
                if contains_data {
                    run.report.count_delivered(subject_id, form_name);
                }
            }
            Err(RedcapError::Rejected { status, body }) => {
                tracing::warn!(
                    study_id = %subject_id,
                    form = %form_name,
                    event = %event_name,
                    status,
                    "REDCap rejected event"
                );
                record_errors(&body, &mut run.report);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Import all deferred blank events as merged records in one call
    async fn send_blanks(&self, run: &mut RunState) -> Result<()> {
        tracing::info!(
            form_events = run.blanks.len(),
            "Sending blank forms in bulk"
        );

        let records = merge_records(run.blanks.iter().map(|b| (&b.identity, &b.fields)));
        run.report.requests_sent += 1;

        match self.sink.send_records(&records, true).await {
            Ok(response) => {
                for blank in &run.blanks {
                    self.tracker.mark_sent(&blank.key).await?;
                }
                tracing::info!(
                    count = response.count,
                    form_events = run.blanks.len(),
                    "Sent blank form-events"
                );
            }
            Err(RedcapError::Rejected { status, body }) => {
                tracing::error!(status, "Failed to send blank form-events");
                record_errors(&body, &mut run.report);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}
