use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use feedcheck_core::{Summary, ValidationResult};
use feedcheck_logging::{check_error, check_info};
use futures_util::FutureExt;
use tokio::sync::{mpsc, Semaphore};

use crate::{CheckSettings, FeedRsDecoder, ReqwestFetcher, SettingsError, Validator};

/// Receives every result as soon as its validation finishes.
///
/// Called concurrently from validation tasks; each call must emit one
/// complete line.
pub trait ResultSink: Send + Sync {
    fn emit(&self, result: &ValidationResult);
}

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// In completion order; correlate by url.
    pub results: Vec<ValidationResult>,
    pub summary: Summary,
    /// Urls refused admission that were never validated.
    pub skipped: Vec<String>,
}

/// Runs the validator over a url list with at most `concurrency` in flight.
pub struct Dispatcher {
    validator: Arc<Validator>,
    admission: Arc<Semaphore>,
    sink: Arc<dyn ResultSink>,
}

impl Dispatcher {
    pub fn new(validator: Validator, concurrency: usize, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            validator: Arc::new(validator),
            admission: Arc::new(Semaphore::new(concurrency)),
            sink,
        }
    }

    /// Dispatcher over the pooled HTTP fetcher and the `feed-rs` decoder.
    pub fn from_settings(
        settings: &CheckSettings,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let fetcher = ReqwestFetcher::new(settings.fetch.clone())?;
        let validator = Validator::new(Arc::new(fetcher), Arc::new(FeedRsDecoder), settings.retry);
        Ok(Self::new(validator, settings.concurrency, sink))
    }

    /// Refuse admission to every url of later runs.
    pub fn close_admission(&self) {
        self.admission.close();
    }

    pub async fn run<I>(&self, urls: I) -> DispatchReport
    where
        I: IntoIterator<Item = String>,
    {
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let mut skipped = Vec::new();
        let mut spawned = 0usize;

        for url in urls {
            // Admission comes first so pending work never outgrows the cap.
            let permit = match self.admission.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    check_error!("Failed to acquire admission for {}: {}", url, err);
                    skipped.push(url);
                    continue;
                }
            };

            let validator = Arc::clone(&self.validator);
            let sink = Arc::clone(&self.sink);
            let result_tx = result_tx.clone();
            tokio::spawn(async move {
                let result = validate_or_recover(&validator, &url).await;
                sink.emit(&result);
                let _ = result_tx.send(result);
                drop(permit);
            });
            spawned += 1;
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(spawned);
        let mut summary = Summary::default();
        while let Some(result) = result_rx.recv().await {
            summary.record(&result);
            results.push(result);
        }

        check_info!(
            "Checked {} feeds: {} valid, {} invalid, {} transient, {} skipped",
            summary.total,
            summary.valid,
            summary.invalid,
            summary.transient,
            skipped.len()
        );

        DispatchReport {
            results,
            summary,
            skipped,
        }
    }
}

/// A panicking validation still yields a result for its url.
async fn validate_or_recover(validator: &Validator, url: &str) -> ValidationResult {
    match AssertUnwindSafe(validator.validate(url)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic_reason(panic.as_ref());
            check_error!("Validation of {} panicked: {}", url, reason);
            ValidationResult::invalid(url.trim(), format!("Validation aborted: {reason}"))
        }
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
