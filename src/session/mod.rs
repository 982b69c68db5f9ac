//! Trading session resolution
//!
//! Maps a reference instant to the next trading session the newsletter is
//! written for. Weekends roll forward to Monday, and so does Friday once the
//! evening cutoff has passed. Pure logic: recompute per run, never cache.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::newsletter::{NewsletterError, NewsletterResult};

/// Hour (local) from which a Friday newsletter is written for Monday
pub const FRIDAY_ROLLOVER_HOUR: u32 = 23;

/// Identifier of a trading session, used to key stored records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId {
    /// `YYYYMMDD`
    pub date_key: String,
    /// Full English weekday name, e.g. "Monday"
    pub weekday_name: String,
}

impl SessionId {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date_key: date.format("%Y%m%d").to_string(),
            weekday_name: date.format("%A").to_string(),
        }
    }

    /// Rebuild a session id from a stored `newsletter_id`
    pub fn from_newsletter_id(newsletter_id: &str) -> NewsletterResult<Self> {
        parse_newsletter_id(newsletter_id).map(Self::from_date)
    }
}

/// Days to add to the reference date to land on the session date
fn days_until_session(weekday: Weekday, hour: u32) -> i64 {
    match weekday {
        Weekday::Fri if hour >= FRIDAY_ROLLOVER_HOUR => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    }
}

/// Resolve the session for a wall-clock instant
pub fn resolve(reference: NaiveDateTime) -> SessionId {
    let days = days_until_session(reference.weekday(), reference.hour());
    SessionId::from_date(reference.date() + Duration::days(days))
}

/// Resolve the session for an instant in the given zone's local time
pub fn resolve_at<Z: TimeZone>(instant: &DateTime<Z>) -> SessionId {
    resolve(instant.naive_local())
}

/// Resolve the session for an UTC instant seen from `tz`
pub fn resolve_in(instant: DateTime<Utc>, tz: Tz) -> SessionId {
    resolve_at(&instant.with_timezone(&tz))
}

/// Validate a `YYYYMMDD` newsletter id and return its date
pub fn parse_newsletter_id(newsletter_id: &str) -> NewsletterResult<NaiveDate> {
    if newsletter_id.len() != 8 || !newsletter_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NewsletterError::validation_error(
            "newsletter_id".to_string(),
            format!("'{}' is not in YYYYMMDD format", newsletter_id),
        ));
    }

    NaiveDate::parse_from_str(newsletter_id, "%Y%m%d").map_err(|_| {
        NewsletterError::validation_error(
            "newsletter_id".to_string(),
            format!("'{}' is not a calendar date", newsletter_id),
        )
    })
}
