use std::future::Future;
use std::time::Duration;

use feedcheck_logging::check_warn;

use crate::{FailureKind, FetchError, FetchOutput, RetrySettings};

/// How one attempt's outcome steers the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptVerdict {
    /// Status 200; the drained body.
    Success(Vec<u8>),
    /// Worth another attempt if any remain.
    RetryStatus(u16),
    RetryTransport(FetchError),
    /// Final regardless of attempts left.
    Rejected(u16),
    Fatal(FetchError),
}

/// Classify one attempt without side effects.
///
/// Transport timeouts and network errors are retryable, as are 429, every
/// 5xx and every other non-200 status outside 4xx. Other 4xx statuses, bad
/// URLs and oversized bodies end the loop at once.
pub fn judge_attempt(attempt: Result<FetchOutput, FetchError>) -> AttemptVerdict {
    match attempt {
        Ok(output) if output.status == 200 => AttemptVerdict::Success(output.bytes),
        Ok(output) if (400..500).contains(&output.status) && output.status != 429 => {
            AttemptVerdict::Rejected(output.status)
        }
        Ok(output) => AttemptVerdict::RetryStatus(output.status),
        Err(err) => match err.kind {
            FailureKind::Timeout | FailureKind::Network => AttemptVerdict::RetryTransport(err),
            FailureKind::InvalidUrl | FailureKind::TooLarge { .. } => AttemptVerdict::Fatal(err),
        },
    }
}

/// Why the retry loop ended without a body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    #[error("{0}")]
    Transport(FetchError),
    #[error("HTTP status {0}")]
    Rejected(u16),
    #[error("Failed after {attempts} attempts, last status: {last_status}")]
    Exhausted { attempts: u32, last_status: u16 },
}

/// Per-invocation loop state, threaded by value through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// 1-based.
    pub attempt: u32,
    pub backoff: Duration,
}

impl RetryState {
    pub fn first(backoff_unit: Duration) -> Self {
        Self {
            attempt: 1,
            backoff: backoff_unit,
        }
    }

    pub fn next(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            backoff: self.backoff.saturating_mul(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    pub result: Result<Vec<u8>, RetryError>,
    pub attempts: u32,
    /// Backoff waits in the order they were slept.
    pub waits: Vec<Duration>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    settings: RetrySettings,
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> RetrySettings {
        self.settings
    }

    /// Drive `attempt` until it succeeds, is rejected, or attempts run out.
    ///
    /// Backoff sleeps suspend only the calling task.
    pub async fn run<F, Fut>(&self, url: &str, mut attempt: F) -> RetryOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<FetchOutput, FetchError>>,
    {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut state = RetryState::first(self.settings.backoff_unit);
        let mut waits = Vec::new();

        loop {
            let last_error = match judge_attempt(attempt().await) {
                AttemptVerdict::Success(body) => {
                    return finish(Ok(body), state, waits);
                }
                AttemptVerdict::Rejected(status) => {
                    return finish(Err(RetryError::Rejected(status)), state, waits);
                }
                AttemptVerdict::Fatal(err) => {
                    return finish(Err(RetryError::Transport(err)), state, waits);
                }
                AttemptVerdict::RetryTransport(err) => {
                    if err.kind == FailureKind::Timeout {
                        check_warn!(
                            "Timeout on attempt {}/{} for {}: {}",
                            state.attempt,
                            max_attempts,
                            url,
                            err.message
                        );
                    } else {
                        check_warn!(
                            "Error on attempt {}/{} for {}: {}",
                            state.attempt,
                            max_attempts,
                            url,
                            err.message
                        );
                    }
                    RetryError::Transport(err)
                }
                AttemptVerdict::RetryStatus(status) => {
                    check_warn!(
                        "Retry {}/{} for {}: HTTP status {}",
                        state.attempt,
                        max_attempts,
                        url,
                        status
                    );
                    RetryError::Exhausted {
                        attempts: max_attempts,
                        last_status: status,
                    }
                }
            };

            if state.attempt >= max_attempts {
                return finish(Err(last_error), state, waits);
            }

            tokio::time::sleep(state.backoff).await;
            waits.push(state.backoff);
            state = state.next();
        }
    }
}

fn finish(
    result: Result<Vec<u8>, RetryError>,
    state: RetryState,
    waits: Vec<Duration>,
) -> RetryOutcome {
    RetryOutcome {
        result,
        attempts: state.attempt,
        waits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Result<FetchOutput, FetchError> {
        Ok(FetchOutput {
            status: code,
            bytes: Vec::new(),
        })
    }

    #[test]
    fn ok_is_success() {
        let verdict = judge_attempt(Ok(FetchOutput {
            status: 200,
            bytes: b"<rss/>".to_vec(),
        }));
        assert_eq!(verdict, AttemptVerdict::Success(b"<rss/>".to_vec()));
    }

    #[test]
    fn client_errors_are_rejected_except_429() {
        assert_eq!(judge_attempt(status(404)), AttemptVerdict::Rejected(404));
        assert_eq!(judge_attempt(status(400)), AttemptVerdict::Rejected(400));
        assert_eq!(judge_attempt(status(499)), AttemptVerdict::Rejected(499));
        assert_eq!(judge_attempt(status(429)), AttemptVerdict::RetryStatus(429));
    }

    #[test]
    fn server_errors_and_odd_statuses_are_retryable() {
        for code in [500, 503, 599, 204, 304] {
            assert_eq!(judge_attempt(status(code)), AttemptVerdict::RetryStatus(code));
        }
    }

    #[test]
    fn transport_failures_split_by_kind() {
        let timeout = FetchError::new(FailureKind::Timeout, "deadline");
        let network = FetchError::new(FailureKind::Network, "refused");
        let bad_url = FetchError::new(FailureKind::InvalidUrl, "builder");
        assert_eq!(
            judge_attempt(Err(timeout.clone())),
            AttemptVerdict::RetryTransport(timeout)
        );
        assert_eq!(
            judge_attempt(Err(network.clone())),
            AttemptVerdict::RetryTransport(network)
        );
        assert_eq!(
            judge_attempt(Err(bad_url.clone())),
            AttemptVerdict::Fatal(bad_url)
        );
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let state = RetryState::first(Duration::from_secs(1));
        let second = state.next();
        let third = second.next();
        assert_eq!(second.attempt, 2);
        assert_eq!(second.backoff, Duration::from_secs(2));
        assert_eq!(third.backoff, Duration::from_secs(4));
    }
}
