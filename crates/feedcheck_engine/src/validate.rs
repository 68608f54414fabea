use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use feedcheck_core::ValidationResult;
use feedcheck_logging::check_debug;
use reqwest::Url;

use crate::{
    DecodeErrorKind, FailureKind, Feed, FeedDecoder, Fetcher, RetryError, RetryPolicy,
    RetrySettings,
};

pub const NO_ITEMS_WARNING: &str = "Warning: No feed items";
pub const STALE_FEED_WARNING: &str = "Warning: Feed hasn't been updated in over 6 months";
const NOT_A_FEED: &str = "Not a valid feed format";
const STALE_AFTER_MONTHS: u32 = 6;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Checks one URL end to end: fetch with retries, decode, classify.
#[derive(Clone)]
pub struct Validator {
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn FeedDecoder>,
    retry: RetryPolicy,
    clock: Clock,
}

impl Validator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<dyn FeedDecoder>,
        retry: RetrySettings,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            retry: RetryPolicy::new(retry),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn validate(&self, raw_url: &str) -> ValidationResult {
        let url_text = raw_url.trim();
        let url = match parse_feed_url(url_text) {
            Ok(url) => url,
            Err(reason) => {
                return ValidationResult::invalid(url_text, format!("Invalid URL: {reason}"))
            }
        };

        let fetcher = &self.fetcher;
        let target = &url;
        let outcome = self
            .retry
            .run(url_text, move || fetcher.fetch(target))
            .await;
        check_debug!(
            "{} finished fetching after {} attempt(s)",
            url_text,
            outcome.attempts
        );

        let body = match outcome.result {
            Ok(body) => body,
            Err(err) => return self.fetch_failure(url_text, err),
        };

        match self.decoder.decode(&body) {
            Ok(feed) => classify_feed(url_text, &feed, (self.clock)()),
            Err(err) => match err.kind {
                DecodeErrorKind::NotAFeed => ValidationResult::invalid(url_text, NOT_A_FEED),
                DecodeErrorKind::Malformed => ValidationResult::invalid(url_text, err.message),
            },
        }
    }

    fn fetch_failure(&self, url: &str, err: RetryError) -> ValidationResult {
        match err {
            RetryError::Transport(fetch_err) => match fetch_err.kind {
                FailureKind::Timeout => ValidationResult::transient(
                    url,
                    format!(
                        "Request timed out after {}",
                        describe_timeout(self.fetcher.request_timeout())
                    ),
                ),
                FailureKind::Network => ValidationResult::transient(url, fetch_err.message),
                FailureKind::InvalidUrl => {
                    ValidationResult::invalid(url, format!("Invalid URL: {}", fetch_err.message))
                }
                FailureKind::TooLarge { .. } => {
                    ValidationResult::invalid(url, fetch_err.kind.to_string())
                }
            },
            RetryError::Rejected(_) => ValidationResult::invalid(url, err.to_string()),
            RetryError::Exhausted { .. } => ValidationResult::transient(url, err.to_string()),
        }
    }
}

fn parse_feed_url(text: &str) -> Result<Url, String> {
    let url = Url::parse(text).map_err(|err| err.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme {other:?}")),
    }
}

/// Classify a decoded feed as seen at `now`.
///
/// The last update is the feed's own timestamp, else the first item's
/// published time. Warnings never change the status. An empty feed takes
/// precedence over staleness, and a feed without any timestamp is never stale.
pub fn classify_feed(url: &str, feed: &Feed, now: DateTime<Utc>) -> ValidationResult {
    let item_count = feed.items.len();
    let last_update = feed
        .updated
        .or_else(|| feed.items.first().and_then(|item| item.published));

    let message = if item_count == 0 {
        NO_ITEMS_WARNING
    } else if last_update.is_some_and(|updated| updated < stale_cutoff(now)) {
        STALE_FEED_WARNING
    } else {
        ""
    };

    ValidationResult::valid(url, item_count, last_update, message)
}

fn stale_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(STALE_AFTER_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whole seconds read as "30 seconds", anything finer as milliseconds.
pub fn describe_timeout(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} ms", timeout.as_millis())
    }
}
