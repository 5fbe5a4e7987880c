//! Per-family publication date parsing.
//!
//! Every newspaper prints dates its own way. The parsers here are strict:
//! input that does not split into exactly the expected number of tokens is
//! rejected instead of guessed at.
//!
//! | Family | Example | Tokens |
//! |--------|---------|--------|
//! | NST | `July 12, 2018 @ 11:35am` | 5 |
//! | Berita Harian | `Bharian Khamis, 12 Julai 2018 @ 11:35AM` | 7 |
//! | Utusan | `1531366500000` (epoch milliseconds) | 1 |
//!
//! Wall-clock times are taken as UTC.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("expected {expected} tokens, found {found} in {input:?}")]
    TokenCount {
        expected: usize,
        found: usize,
        input: String,
    },
    #[error("unknown month {0:?}")]
    Month(String),
    #[error("invalid day {0:?}")]
    Day(String),
    #[error("invalid year {0:?}")]
    Year(String),
    #[error("invalid time {0:?}")]
    Time(String),
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
    #[error("no such date {0:?}")]
    OutOfRange(String),
}

/// Parse an NST `post-date` such as `July 12, 2018 @ 11:35am`.
pub fn parse_nst(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let parts = tokens(input, 5)?;
    let month = english_month(parts[0]).ok_or_else(|| DateParseError::Month(parts[0].into()))?;
    let day = parse_day(parts[1])?;
    let year = parse_year(parts[2])?;
    let (hour, minute) = parse_clock(parts[4])?;
    assemble(input, year, month, day, hour, minute)
}

/// Parse a Berita Harian `node-meta` line such as
/// `Bharian Khamis, 12 Julai 2018 @ 11:35AM`.
pub fn parse_bharian(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let parts = tokens(input, 7)?;
    let month = malay_month(parts[3]).ok_or_else(|| DateParseError::Month(parts[3].into()))?;
    let day = parse_day(parts[2])?;
    let year = parse_year(parts[4])?;
    let (hour, minute) = parse_clock(parts[6])?;
    assemble(input, year, month, day, hour, minute)
}

/// Parse a Utusan `data-timestamp` attribute (milliseconds since the epoch).
pub fn parse_epoch_millis(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let parts = tokens(input, 1)?;
    let millis: i64 = parts[0]
        .parse()
        .map_err(|_| DateParseError::Timestamp(input.to_string()))?;
    // Sub-second precision is dropped.
    Utc.timestamp_opt(millis.div_euclid(1000), 0)
        .single()
        .ok_or_else(|| DateParseError::Timestamp(input.to_string()))
}

fn tokens(input: &str, expected: usize) -> Result<Vec<&str>, DateParseError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != expected {
        return Err(DateParseError::TokenCount {
            expected,
            found: parts.len(),
            input: input.trim().to_string(),
        });
    }
    Ok(parts)
}

fn english_month(s: &str) -> Option<u32> {
    let m = match s {
        "January" => 1,
        "February" => 2,
        "March" => 3,
        "April" => 4,
        "May" => 5,
        "June" => 6,
        "July" => 7,
        "August" => 8,
        "September" => 9,
        "October" => 10,
        "November" => 11,
        "December" => 12,
        _ => return None,
    };
    Some(m)
}

/// Malay month names, accepted in full, upper case, or as the 3-letter
/// abbreviation used on listing pages.
fn malay_month(s: &str) -> Option<u32> {
    let m = match s.to_lowercase().as_str() {
        "januari" | "jan" => 1,
        "februari" | "feb" => 2,
        "mac" => 3,
        "april" | "apr" => 4,
        "mei" => 5,
        "jun" => 6,
        "julai" | "jul" => 7,
        "ogos" | "ogo" => 8,
        "september" | "sep" => 9,
        "oktober" | "okt" => 10,
        "november" | "nov" => 11,
        "disember" | "dis" => 12,
        _ => return None,
    };
    Some(m)
}

fn parse_day(s: &str) -> Result<u32, DateParseError> {
    let day = s.trim_matches(',');
    day.parse().map_err(|_| DateParseError::Day(day.to_string()))
}

fn parse_year(s: &str) -> Result<i32, DateParseError> {
    s.parse().map_err(|_| DateParseError::Year(s.to_string()))
}

/// `11:35am` / `9:05PM` to a 24-hour `(hour, minute)`.
fn parse_clock(s: &str) -> Result<(u32, u32), DateParseError> {
    let bad = || DateParseError::Time(s.to_string());
    if s.len() < 3 || !s.is_char_boundary(s.len() - 2) {
        return Err(bad());
    }
    let (clock, suffix) = s.split_at(s.len() - 2);
    let pm = match suffix {
        "AM" | "am" => false,
        "PM" | "pm" => true,
        _ => return Err(bad()),
    };

    let (h, m) = clock.split_once(':').ok_or_else(bad)?;
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(bad());
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Ok((hour, minute))
}

fn assemble(
    input: &str,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Utc>, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DateParseError::OutOfRange(input.trim().to_string()))
}
