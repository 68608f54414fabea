use std::error::Error as _;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{StatusCode, Url};

use crate::settings::header_value;
use crate::{FailureKind, FetchError, FetchOutput, FetchSettings, SettingsError};

/// Performs exactly one GET per call. Retrying is the caller's concern.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError>;

    /// Deadline of one attempt, as reported in timeout messages.
    fn request_timeout(&self) -> Duration;
}

/// Fetcher backed by one pooled `reqwest::Client` shared by every caller.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let client = build_client(&settings)?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}

fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, SettingsError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("User-Agent", &settings.user_agent)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("Accept-Language", &settings.accept_language)?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .pool_max_idle_per_host(settings.pool_max_idle_per_host)
        .pool_idle_timeout(settings.pool_idle_timeout)
        .build()
        .map_err(|err| SettingsError::Client(err.to_string()))
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchOutput, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            // Dropping the response releases the connection without reading the body.
            return Ok(FetchOutput {
                status: status.as_u16(),
                bytes: Vec::new(),
            });
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchOutput {
            status: status.as_u16(),
            bytes,
        })
    }

    fn request_timeout(&self) -> Duration {
        self.settings.request_timeout
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    let message = error_chain(&err);
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, message);
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, message);
    }
    FetchError::new(FailureKind::Network, message)
}

/// `reqwest` keeps the useful cause (DNS, refused, TLS) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
