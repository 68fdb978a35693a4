//! Defensive date parsing.
//!
//! Stored dates are RFC 3339, but dates arriving from forms and older
//! records come in several shapes, and naive `YYYY-MM-DD` parsing behaves
//! differently across browser engines. The parser here is total: it tries
//! the strict forms first, degrades through looser ones, and falls back to
//! the current time with a logged warning rather than erroring.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use log::warn;

/// Parse a date string without ever failing.
///
/// Strategy order: RFC 3339 with timezone, then `YYYY-MM-DDTHH:MM:SS`
/// without timezone (assumed UTC), then `YYYY-MM-DD`, then `DD/MM/YYYY`,
/// then a manual year/month/day decomposition. If every strategy fails the
/// current time is returned and a warning is logged.
pub fn parse_date_defensive(value: &str) -> DateTime<FixedOffset> {
    let trimmed = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(trimmed) {
        return date;
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return naive.and_utc().fixed_offset();
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return naive.and_utc().fixed_offset();
        }
    }

    // chrono's %Y accepts variable-length years, so "1/2/3" would parse as
    // year 3; require a four-digit year field before trying this shape.
    let slash_fields: Vec<&str> = trimmed.split('/').collect();
    if slash_fields.len() == 3 && slash_fields[2].len() == 4 {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return naive.and_utc().fixed_offset();
            }
        }
    }

    if let Some(date) = decompose_ymd(trimmed) {
        return date;
    }

    warn!("could not parse date '{}', falling back to now", value);
    Utc::now().fixed_offset()
}

/// Last-resort decomposition: split on '-' or '/', take three numeric
/// fields, and treat the four-digit field as the year whether it comes
/// first or last.
fn decompose_ymd(value: &str) -> Option<DateTime<FixedOffset>> {
    let date_part = value.split(['T', ' ']).next()?;
    let fields: Vec<&str> = date_part.split(['-', '/']).collect();
    if fields.len() != 3 {
        return None;
    }
    let numbers: Vec<i32> = fields.iter().map(|f| f.parse().ok()).collect::<Option<_>>()?;

    let (year, month, day) = if fields[0].len() == 4 {
        (numbers[0], numbers[1], numbers[2])
    } else if fields[2].len() == 4 {
        (numbers[2], numbers[1], numbers[0])
    } else {
        return None;
    };

    let date = NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().fixed_offset())
}
