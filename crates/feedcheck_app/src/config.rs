//! Optional RON configuration file.
//!
//! Every field may be omitted; omitted fields keep the engine defaults.
//! Command-line flags are applied on top of the loaded values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use feedcheck_engine::{CheckSettings, FetchSettings, RetrySettings};
use feedcheck_logging::check_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        let settings = CheckSettings::default();
        Self {
            concurrency: settings.concurrency,
            max_attempts: settings.retry.max_attempts,
            backoff_ms: settings.retry.backoff_unit.as_millis() as u64,
            timeout_secs: settings.fetch.request_timeout.as_secs(),
            connect_timeout_secs: settings.fetch.connect_timeout.as_secs(),
            redirect_limit: settings.fetch.redirect_limit,
            max_bytes: settings.fetch.max_bytes,
            user_agent: settings.fetch.user_agent,
            accept_language: settings.fetch.accept_language,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        check_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn into_settings(self) -> CheckSettings {
        let defaults = FetchSettings::default();
        CheckSettings {
            concurrency: self.concurrency,
            retry: RetrySettings {
                max_attempts: self.max_attempts,
                backoff_unit: Duration::from_millis(self.backoff_ms),
            },
            fetch: FetchSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.timeout_secs),
                redirect_limit: self.redirect_limit,
                max_bytes: self.max_bytes,
                user_agent: self.user_agent,
                accept_language: self.accept_language,
                ..defaults
            },
        }
    }
}
