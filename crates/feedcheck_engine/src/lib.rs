//! Feedcheck engine: fetch, retry, decode and classify feed URLs under bounded concurrency.
mod decode;
mod dispatch;
mod fetch;
mod retry;
mod settings;
mod types;
mod validate;

pub use decode::{DecodeError, DecodeErrorKind, Feed, FeedDecoder, FeedItem, FeedRsDecoder};
pub use dispatch::{DispatchReport, Dispatcher, ResultSink};
pub use fetch::{Fetcher, ReqwestFetcher};
pub use reqwest::Url;
pub use retry::{judge_attempt, AttemptVerdict, RetryError, RetryOutcome, RetryPolicy, RetryState};
pub use settings::{CheckSettings, FetchSettings, RetrySettings, SettingsError};
pub use types::{FailureKind, FetchError, FetchOutput};
pub use validate::{
    classify_feed, describe_timeout, Clock, Validator, NO_ITEMS_WARNING, STALE_FEED_WARNING,
};
