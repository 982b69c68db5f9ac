//! Raw newsletter documents as handed over by the mail collaborator,
//! plus the duplicate gate that runs before any extraction work.

pub mod dedup;
pub mod errors;
pub mod source;

pub use dedup::is_duplicate;
pub use errors::{NewsletterError, NewsletterResult};
pub use source::{JsonFileSource, MailSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched newsletter email. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub subject: String,
    pub body: String,
    pub received_at: ReceivedAt,
}

impl RawDocument {
    /// Build a document from the mail header date string, degrading to the
    /// raw string when it cannot be parsed.
    pub fn new(subject: impl Into<String>, body: impl Into<String>, date_string: &str) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            received_at: ReceivedAt::parse(date_string),
        }
    }
}

/// Received date of a newsletter. Unparseable headers are kept verbatim
/// instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReceivedAt {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl ReceivedAt {
    /// Parse an RFC 2822 mail date (RFC 3339 accepted as a fallback).
    pub fn parse(date_string: &str) -> Self {
        let trimmed = date_string.trim();

        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return ReceivedAt::Parsed(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return ReceivedAt::Parsed(dt.with_timezone(&Utc));
        }

        tracing::warn!(date = %date_string, "Unparseable received date, keeping raw header");
        ReceivedAt::Raw(date_string.to_string())
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ReceivedAt::Parsed(dt) => Some(*dt),
            ReceivedAt::Raw(_) => None,
        }
    }

    /// The textual form stored alongside the row
    pub fn as_text(&self) -> String {
        match self {
            ReceivedAt::Parsed(dt) => dt.to_rfc2822(),
            ReceivedAt::Raw(raw) => raw.clone(),
        }
    }
}
