use std::time::Duration;

use reqwest::header::HeaderValue;
use thiserror::Error;
use tokio::sync::Semaphore;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; FeedValidator/1.0)";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US;q=0.7,en;q=0.3";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("concurrency must be between 1 and {max}, got {actual}")]
    Concurrency { max: usize, actual: usize },
    #[error("max attempts must be at least 1")]
    MaxAttempts,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("max bytes must be greater than zero")]
    MaxBytes,
    #[error("invalid {name} header value: {value:?}")]
    Header { name: &'static str, value: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Deadline for one attempt, headers and body included.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 10,
            max_bytes: 20 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl FetchSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.connect_timeout.is_zero() {
            return Err(SettingsError::ZeroDuration("connect timeout"));
        }
        if self.request_timeout.is_zero() {
            return Err(SettingsError::ZeroDuration("request timeout"));
        }
        if self.max_bytes == 0 {
            return Err(SettingsError::MaxBytes);
        }
        header_value("User-Agent", &self.user_agent)?;
        header_value("Accept-Language", &self.accept_language)?;
        Ok(())
    }
}

pub(crate) fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, SettingsError> {
    HeaderValue::from_str(value).map_err(|_| SettingsError::Header {
        name,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Wait before the first retry; doubles for every later one.
    pub backoff_unit: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_attempts == 0 {
            return Err(SettingsError::MaxAttempts);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub concurrency: usize,
    pub retry: RetrySettings,
    pub fetch: FetchSettings,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            concurrency: 60,
            retry: RetrySettings::default(),
            fetch: FetchSettings::default(),
        }
    }
}

impl CheckSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.concurrency == 0 || self.concurrency > Semaphore::MAX_PERMITS {
            return Err(SettingsError::Concurrency {
                max: Semaphore::MAX_PERMITS,
                actual: self.concurrency,
            });
        }
        self.retry.validate()?;
        self.fetch.validate()
    }
}
