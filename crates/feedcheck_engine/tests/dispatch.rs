use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feedcheck_core::{Status, Summary, ValidationResult};
use feedcheck_engine::{
    DecodeError, DecodeErrorKind, Dispatcher, FailureKind, Feed, FeedDecoder, FeedItem,
    FetchError, FetchOutput, Fetcher, ResultSink, RetrySettings, Url, Validator,
};
use pretty_assertions::assert_eq;

/// Behaviour is picked from the first path segment of the url.
#[derive(Default)]
struct ScriptedFetcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    attempts: Mutex<HashMap<String, u32>>,
}

impl ScriptedFetcher {
    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn attempts_for(&self, url: &str) -> u32 {
        self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let ok = |body: &str| -> Result<FetchOutput, FetchError> {
            Ok(FetchOutput {
                status: 200,
                bytes: body.as_bytes().to_vec(),
            })
        };
        let status = |code: u16| -> Result<FetchOutput, FetchError> {
            Ok(FetchOutput {
                status: code,
                bytes: Vec::new(),
            })
        };
        match url.path_segments().and_then(|mut s| s.next()) {
            Some("ok") => ok("items"),
            Some("empty") => ok("none"),
            Some("junk") => ok("junk"),
            Some("missing") => status(404),
            Some("flaky") if attempt < 3 => status(503),
            Some("flaky") => ok("items"),
            Some("down") => status(502),
            _ => Err(FetchError::new(FailureKind::Network, "connection refused")),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

struct TagDecoder;

impl FeedDecoder for TagDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Feed, DecodeError> {
        match bytes {
            b"items" => Ok(Feed {
                items: vec![FeedItem { published: None }],
                updated: None,
            }),
            b"none" => Ok(Feed::default()),
            _ => Err(DecodeError::new(DecodeErrorKind::Malformed, "unexpected tag")),
        }
    }
}

struct PanickingDecoder;

impl FeedDecoder for PanickingDecoder {
    fn decode(&self, _bytes: &[u8]) -> Result<Feed, DecodeError> {
        panic!("decoder blew up")
    }
}

#[derive(Default)]
struct CollectingSink {
    lines: Mutex<Vec<String>>,
}

impl ResultSink for CollectingSink {
    fn emit(&self, result: &ValidationResult) {
        self.lines.lock().unwrap().push(result.report_line());
    }
}

fn dispatcher(
    fetcher: Arc<ScriptedFetcher>,
    concurrency: usize,
    sink: Arc<CollectingSink>,
) -> Dispatcher {
    dispatcher_with_decoder(fetcher, Arc::new(TagDecoder), concurrency, sink)
}

fn dispatcher_with_decoder(
    fetcher: Arc<ScriptedFetcher>,
    decoder: Arc<dyn FeedDecoder>,
    concurrency: usize,
    sink: Arc<CollectingSink>,
) -> Dispatcher {
    let validator = Validator::new(
        fetcher,
        decoder,
        RetrySettings {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(1),
        },
    );
    Dispatcher::new(validator, concurrency, sink)
}

fn mixed_urls(count: usize) -> Vec<String> {
    const KINDS: [&str; 7] = ["ok", "empty", "junk", "missing", "flaky", "down", "refused"];
    (0..count)
        .map(|i| format!("https://feeds.test/{}/{i}", KINDS[i % KINDS.len()]))
        .collect()
}

fn sorted(results: &[ValidationResult]) -> Vec<(String, Status, String)> {
    let mut rows: Vec<_> = results
        .iter()
        .map(|r| (r.url().to_string(), r.status(), r.message().to_string()))
        .collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn every_url_yields_exactly_one_result() {
    let urls = mixed_urls(21);
    let sink = Arc::new(CollectingSink::default());
    let report = dispatcher(Arc::default(), 4, sink.clone())
        .run(urls.clone())
        .await;

    let mut seen: Vec<_> = report.results.iter().map(|r| r.url().to_string()).collect();
    seen.sort();
    let mut expected = urls;
    expected.sort();
    assert_eq!(seen, expected);
    assert!(report.skipped.is_empty());
    assert_eq!(sink.lines.lock().unwrap().len(), 21);
}

#[tokio::test]
async fn outcomes_are_classified_and_counted() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let report = dispatcher(fetcher.clone(), 8, Arc::default())
        .run(mixed_urls(7))
        .await;

    let by_url: HashMap<_, _> = report
        .results
        .iter()
        .map(|r| (r.url().to_string(), (r.status(), r.message().to_string())))
        .collect();
    assert_eq!(
        by_url["https://feeds.test/ok/0"],
        (Status::Valid, String::new())
    );
    assert_eq!(
        by_url["https://feeds.test/empty/1"],
        (Status::Valid, "Warning: No feed items".to_string())
    );
    assert_eq!(
        by_url["https://feeds.test/junk/2"],
        (Status::Invalid, "unexpected tag".to_string())
    );
    assert_eq!(
        by_url["https://feeds.test/missing/3"],
        (Status::Invalid, "HTTP status 404".to_string())
    );
    assert_eq!(
        by_url["https://feeds.test/flaky/4"],
        (Status::Valid, String::new())
    );
    assert_eq!(
        by_url["https://feeds.test/down/5"],
        (
            Status::Transient,
            "Failed after 3 attempts, last status: 502".to_string()
        )
    );
    assert_eq!(
        by_url["https://feeds.test/refused/6"],
        (Status::Transient, "connection refused".to_string())
    );

    assert_eq!(
        report.summary,
        Summary {
            valid: 3,
            invalid: 2,
            transient: 2,
            warnings: 1,
            total: 7,
        }
    );
    assert_eq!(fetcher.attempts_for("https://feeds.test/missing/3"), 1);
    assert_eq!(fetcher.attempts_for("https://feeds.test/flaky/4"), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_validations_never_exceed_the_cap() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let urls: Vec<_> = (0..40).map(|i| format!("https://feeds.test/ok/{i}")).collect();

    let report = dispatcher(fetcher.clone(), 3, Arc::default()).run(urls).await;

    assert_eq!(report.summary.total, 40);
    assert!(fetcher.peak() <= 3, "peak was {}", fetcher.peak());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_level_does_not_change_outcomes() {
    let urls = mixed_urls(100);

    let serial = dispatcher(Arc::default(), 1, Arc::default())
        .run(urls.clone())
        .await;
    let parallel = dispatcher(Arc::default(), 60, Arc::default())
        .run(urls)
        .await;

    assert_eq!(serial.results.len(), 100);
    assert_eq!(sorted(&serial.results), sorted(&parallel.results));
    assert_eq!(serial.summary, parallel.summary);
}

#[tokio::test]
async fn closed_admission_skips_urls_instead_of_hanging() {
    let sink = Arc::new(CollectingSink::default());
    let dispatcher = dispatcher(Arc::default(), 2, sink.clone());
    dispatcher.close_admission();

    let urls = mixed_urls(3);
    let report = dispatcher.run(urls.clone()).await;

    assert!(report.results.is_empty());
    assert_eq!(report.skipped, urls);
    assert_eq!(report.summary.total, 0);
    assert!(sink.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_input_produces_empty_report() {
    let report = dispatcher(Arc::default(), 2, Arc::default())
        .run(Vec::new())
        .await;

    assert!(report.results.is_empty());
    assert_eq!(report.summary, Summary::default());
}

#[tokio::test]
async fn panicking_validation_still_yields_a_result() {
    let sink = Arc::new(CollectingSink::default());
    let urls = vec![
        "https://feeds.test/ok/0".to_string(),
        "https://feeds.test/ok/1".to_string(),
    ];

    let report = dispatcher_with_decoder(
        Arc::default(),
        Arc::new(PanickingDecoder),
        2,
        sink.clone(),
    )
    .run(urls.clone())
    .await;

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.invalid, 2);
    assert!(report.skipped.is_empty());
    for result in &report.results {
        assert_eq!(result.status(), Status::Invalid);
        assert_eq!(result.message(), "Validation aborted: decoder blew up");
    }
    let mut seen: Vec<_> = report.results.iter().map(|r| r.url().to_string()).collect();
    seen.sort();
    assert_eq!(seen, urls);
    assert_eq!(sink.lines.lock().unwrap().len(), 2);
}
