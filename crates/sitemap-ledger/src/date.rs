//! `lastmod` timestamp normalisation.
//!
//! Sitemaps publish W3C datetimes in a handful of shapes. Only the calendar
//! date survives normalisation; time of day and offset are dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{LedgerError, Result};
use crate::sitemap::SitemapEntry;

/// How a layout carries its timezone.
#[derive(Debug, Clone, Copy)]
enum Zone {
    /// Literal `Z` suffix.
    Utc,
    /// Numeric `+hh:mm` / `-hh:mm` offset.
    Offset,
}

/// Accepted layouts, tried in order.
const LAYOUTS: &[(&str, Zone)] = &[
    ("%Y-%m-%dT%H:%M:%S%.fZ", Zone::Utc),
    ("%Y-%m-%dT%H:%M:%SZ", Zone::Utc),
    ("%Y-%m-%dT%H:%M:%S%:z", Zone::Offset),
    ("%Y-%m-%dT%H:%M:%S%.f%:z", Zone::Offset),
];

/// Parse a `lastmod` value into its calendar date.
///
/// For offset layouts the date is the one written in the string, i.e. the
/// local date at the stated offset, not the UTC date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    if !strict_shape(raw) {
        return Err(LedgerError::DateFormat(raw.to_string()));
    }
    for (layout, zone) in LAYOUTS {
        let parsed = match zone {
            Zone::Utc => NaiveDateTime::parse_from_str(raw, layout).map(|dt| dt.date()),
            Zone::Offset => DateTime::parse_from_str(raw, layout).map(|dt| dt.date_naive()),
        };
        if let Ok(date) = parsed {
            return Ok(date);
        }
    }
    Err(LedgerError::DateFormat(raw.to_string()))
}

/// Whether `s` is a calendar date written exactly as `YYYY-MM-DD`.
pub fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Rejects what chrono would tolerate but the layouts do not allow:
/// whitespace anywhere, and fractional seconds outside 1..=6 digits.
fn strict_shape(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    match raw.split_once('.') {
        None => true,
        Some((_, rest)) => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            (1..=6).contains(&digits)
        }
    }
}

/// A sitemap entry whose `lastmod` has been reduced to a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub url: String,
    pub date: NaiveDate,
}

impl NormalizedEntry {
    pub fn from_entry(entry: SitemapEntry) -> Result<Self> {
        let date = parse_date(&entry.raw_date)?;
        Ok(Self {
            url: entry.url,
            date,
        })
    }

    /// The date as `YYYY-MM-DD`.
    pub fn isoformat(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
