//! Rate limiting for record sinks
//!
//! [`Throttle`] wraps any [`RecordSink`] and delays calls so that no more
//! than `max_calls` start within any window of `period`. It does not batch,
//! retry or translate errors.

use crate::adapters::redcap::{ImportResponse, RecordSink};
use crate::domain::{RedcapError, UploadRecord};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter around a record sink
pub struct Throttle<S> {
    inner: S,
    max_calls: usize,
    period: Duration,
    /// Start times of the calls inside the current window, oldest first
    calls: Mutex<VecDeque<Instant>>,
}

impl<S> Throttle<S> {
    /// Wrap `inner`, allowing at most `max_calls` calls per `period`
    ///
    /// A `max_calls` of zero is treated as one.
    pub fn new(inner: S, max_calls: u32, period: Duration) -> Self {
        let max_calls = max_calls.max(1) as usize;
        Self {
            inner,
            max_calls,
            period,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// The wrapped sink
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Wait until a call may start, then record it
    pub async fn acquire(&self) {
        let mut calls = self.calls.lock().await;
        loop {
            let now = Instant::now();
            while calls
                .front()
                .is_some_and(|&start| start + self.period <= now)
            {
                calls.pop_front();
            }

            if calls.len() < self.max_calls {
                calls.push_back(now);
                return;
            }

            if let Some(&oldest) = calls.front() {
                let resume_at = oldest + self.period;
                tracing::debug!(
                    wait_ms = (resume_at - now).as_millis() as u64,
                    max_calls = self.max_calls,
                    "Rate limit reached, waiting"
                );
                tokio::time::sleep_until(resume_at).await;
            }
        }
    }
}

#[async_trait]
impl<S: RecordSink> RecordSink for Throttle<S> {
    async fn send_records(
        &self,
        records: &[UploadRecord],
        overwrite: bool,
    ) -> Result<ImportResponse, RedcapError> {
        self.acquire().await;
        self.inner.send_records(records, overwrite).await
    }

    fn def_field(&self) -> &str {
        self.inner.def_field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSink {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RecordSink for CountingSink {
        async fn send_records(
            &self,
            records: &[UploadRecord],
            _overwrite: bool,
        ) -> Result<ImportResponse, RedcapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RedcapError::Rejected {
                    status: 400,
                    body: "nope".to_string(),
                });
            }
            Ok(ImportResponse::new(records.len()))
        }

        fn def_field(&self) -> &str {
            "record_id"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_under_limit_do_not_wait() {
        let throttle = Throttle::new(CountingSink::new(false), 3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            throttle.send_records(&[], true).await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(throttle.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_limit_waits_for_window() {
        let throttle = Throttle::new(CountingSink::new(false), 2, Duration::from_secs(10));
        let start = Instant::now();

        throttle.send_records(&[], true).await.unwrap();
        throttle.send_records(&[], true).await.unwrap();
        throttle.send_records(&[], true).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(throttle.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let throttle = Throttle::new(CountingSink::new(false), 2, Duration::from_secs(10));
        let start = Instant::now();

        throttle.send_records(&[], true).await.unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        throttle.send_records(&[], true).await.unwrap();
        throttle.send_records(&[], true).await.unwrap();

        // third call waits only for the first to leave the window
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        throttle.send_records(&[], true).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_pass_through_unchanged() {
        let throttle = Throttle::new(CountingSink::new(true), 1, Duration::from_secs(1));
        let err = throttle.send_records(&[], true).await.unwrap_err();
        assert_eq!(err.rejection_body(), Some("nope"));
        assert_eq!(throttle.def_field(), "record_id");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_treated_as_one() {
        let throttle = Throttle::new(CountingSink::new(false), 0, Duration::from_secs(5));
        let start = Instant::now();

        throttle.send_records(&[], true).await.unwrap();
        throttle.send_records(&[], true).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
