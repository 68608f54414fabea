use chrono::{DateTime, Utc};
use feed_rs::parser::{ParseErrorKind, ParseFeedError};

/// The parts of a syndication feed the health check looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub items: Vec<FeedItem>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The body is empty or is not a feed document at all.
    NotAFeed,
    /// The body looks like a feed but does not parse.
    Malformed,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub message: String,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub trait FeedDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Feed, DecodeError>;
}

/// RSS, Atom and JSON Feed decoding through `feed-rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedRsDecoder;

impl FeedDecoder for FeedRsDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Feed, DecodeError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::new(DecodeErrorKind::NotAFeed, "empty document"));
        }

        let parsed = feed_rs::parser::parse(bytes).map_err(map_parse_error)?;
        Ok(Feed {
            updated: parsed.updated,
            items: parsed
                .entries
                .iter()
                .map(|entry| FeedItem {
                    published: entry.published.or(entry.updated),
                })
                .collect(),
        })
    }
}

fn map_parse_error(err: ParseFeedError) -> DecodeError {
    match err {
        ParseFeedError::ParseError(
            ParseErrorKind::NoFeedRoot | ParseErrorKind::UnknownMimeType(_),
        ) => DecodeError::new(DecodeErrorKind::NotAFeed, err.to_string()),
        other => {
            let message = other.to_string();
            if signals_end_of_input(&message) {
                DecodeError::new(DecodeErrorKind::NotAFeed, message)
            } else {
                DecodeError::new(DecodeErrorKind::Malformed, message)
            }
        }
    }
}

/// feed-rs reports a truncated document only through the reader's error text.
fn signals_end_of_input(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("end of input") || message.contains("eof")
}
