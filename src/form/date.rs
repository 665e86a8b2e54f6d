/*
 * Responsibility
 * - transport format `DD/MM/YYYY | HH:MM:SS` <-> input format `YYYY-MM-DD`
 * - age calculation for the date-of-birth rule
 *
 * Conversion is purely textual: 31/02 survives a round-trip unchanged.
 */
use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub const MIDNIGHT: &str = "00:00:00";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateFormatError {
    #[error("expected YYYY-MM-DD, got {0:?}")]
    InvalidInputDate(String),
    #[error("expected DD/MM/YYYY | HH:MM:SS, got {0:?}")]
    InvalidTransportDate(String),
}

/// Year, month and day as typed, without calendar checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

fn numeric(part: &str, width: usize) -> Option<&str> {
    (part.len() == width && part.bytes().all(|b| b.is_ascii_digit())).then_some(part)
}

/// Splits `YYYY-MM-DD` into its parts.
pub fn parse_input(input: &str) -> Result<DateParts, DateFormatError> {
    let err = || DateFormatError::InvalidInputDate(input.to_string());

    let mut it = input.trim().split('-');
    let (Some(y), Some(m), Some(d), None) = (it.next(), it.next(), it.next(), it.next()) else {
        return Err(err());
    };

    let year = numeric(y, 4).and_then(|s| s.parse().ok()).ok_or_else(err)?;
    let month = numeric(m, 2).and_then(|s| s.parse().ok()).ok_or_else(err)?;
    let day = numeric(d, 2).and_then(|s| s.parse().ok()).ok_or_else(err)?;

    Ok(DateParts { year, month, day })
}

/// `1995-07-04` -> `04/07/1995 | 00:00:00`
pub fn to_transport(input: &str) -> Result<String, DateFormatError> {
    let p = parse_input(input)?;
    Ok(format!(
        "{:02}/{:02}/{:04} | {MIDNIGHT}",
        p.day, p.month, p.year
    ))
}

/// `04/07/1995 | 00:00:00` -> `1995-07-04`. The time part is dropped.
pub fn from_transport(transport: &str) -> Result<String, DateFormatError> {
    let err = || DateFormatError::InvalidTransportDate(transport.to_string());

    let date_part = transport.split(" | ").next().unwrap_or_default().trim();

    let mut it = date_part.split('/');
    let (Some(d), Some(m), Some(y), None) = (it.next(), it.next(), it.next(), it.next()) else {
        return Err(err());
    };

    let (Some(d), Some(m), Some(y)) = (numeric(d, 2), numeric(m, 2), numeric(y, 4)) else {
        return Err(err());
    };

    Ok(format!("{y}-{m}-{d}"))
}

/// Whole years between `birth` and `today`, decremented when this year's
/// birthday has not happened yet.
pub fn age_on(birth: DateParts, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year;
    let month_diff = today.month() as i64 - birth.month as i64;
    if month_diff < 0 || (month_diff == 0 && today.day() < birth.day) {
        age -= 1;
    }
    age
}
