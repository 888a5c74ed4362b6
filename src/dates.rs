//! Display dates and their sort order.
//!
//! Items store dates the way a reader sees them (`March 3, 2024`), not in a
//! sortable form. Anything that orders items parses them back with
//! [`parse_display_date`], and values that can't be parsed sort as
//! [`epoch`], i.e. oldest.

use chrono::{DateTime, Local, NaiveDate};

/// Output format for every date the system writes.
pub const DISPLAY_FORMAT: &str = "%B %-d, %Y";

/// Accepted input formats, tried in order after the RFC 3339 check.
const PARSE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
];

/// Source of "today" for created/updated stamps.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Parse a stored date string. Returns `None` for anything unrecognized.
pub fn parse_display_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    PARSE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Fallback sort date for unparsable values.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Sort key for a stored date string.
pub fn sort_key(value: &str) -> NaiveDate {
    parse_display_date(value).unwrap_or_else(epoch)
}

/// ISO `YYYY-MM-DD`, as used by the sitemap.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
