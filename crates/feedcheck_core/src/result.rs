use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Valid,
    Invalid,
    Transient,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Valid => "valid",
            Status::Invalid => "invalid",
            Status::Transient => "transient",
        }
    }

    /// Marker used in front of every per-result line.
    pub fn symbol(self) -> &'static str {
        match self {
            Status::Valid => "✅",
            Status::Invalid => "❌",
            Status::Transient => "⚠️",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one feed URL.
///
/// Built once through one of the constructors and read through accessors only.
/// `item_count` and `last_update` carry data only for [`Status::Valid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    url: String,
    status: Status,
    message: String,
    item_count: usize,
    last_update: Option<DateTime<Utc>>,
}

impl ValidationResult {
    pub fn valid(
        url: impl Into<String>,
        item_count: usize,
        last_update: Option<DateTime<Utc>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: Status::Valid,
            message: message.into(),
            item_count,
            last_update,
        }
    }

    pub fn invalid(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failed(url, Status::Invalid, message)
    }

    pub fn transient(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failed(url, Status::Transient, message)
    }

    fn failed(url: impl Into<String>, status: Status, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            message: message.into(),
            item_count: 0,
            last_update: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Empty when there is nothing to remark.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn has_warning(&self) -> bool {
        self.status == Status::Valid && !self.message.is_empty()
    }

    /// Single report line: symbol, url, status and the message when present.
    pub fn report_line(&self) -> String {
        let mut line = format!("{} {} → {}", self.status.symbol(), self.url, self.status);
        if !self.message.is_empty() {
            line.push_str(&format!(" ({})", self.message));
        }
        line
    }
}
