//! Seed url generation: a dated schema expanded into one url per day.

use chrono::{Local, NaiveDate};

use crate::error::{ArchiveError, Result};

/// How a date is rendered into the `{}` slot of a schema url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `20160401` - what the dated review archives use.
    Compact,
    /// `2016-04-01`
    Dashed,
}

impl DateStyle {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "compact" => Some(DateStyle::Compact),
            "dashed" => Some(DateStyle::Dashed),
            _ => None,
        }
    }

    fn render(&self, date: NaiveDate) -> String {
        match self {
            DateStyle::Compact => date.format("%Y%m%d").to_string(),
            DateStyle::Dashed => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Parses a date argument: the literal `today` or strict `YYYY-MM-DD`.
/// Anything looser is rejected; `2016-4-1` names a different page than
/// `2016-04-01` on a dated archive, so it must not be silently accepted.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s == "today" {
        return Ok(Local::now().date_naive());
    }

    if !is_strict_ymd(s) {
        return Err(ArchiveError::InvalidArgument(format!(
            "date must be 'today' or YYYY-MM-DD, got '{s}'"
        )));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ArchiveError::InvalidArgument(format!("invalid date '{s}': {e}")))
}

// chrono alone accepts unpadded fields; check the digit shape first.
fn is_strict_ymd(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&i| bytes[i].is_ascii_digit())
}

/// Expands a schema url containing a `{}` placeholder into one url per day,
/// newest first, walking from `from` back to `until` inclusive.
///
/// `until` after `from` is an error, not an empty or unbounded walk.
pub fn archive_urls(schema: &str, from: &str, until: &str, style: DateStyle) -> Result<Vec<String>> {
    if !schema.contains("{}") {
        return Err(ArchiveError::InvalidArgument(format!(
            "schema must contain a {{}} date placeholder, got '{schema}'"
        )));
    }

    let from = parse_date(from)?;
    let until = parse_date(until)?;
    if until > from {
        return Err(ArchiveError::InvalidArgument(format!(
            "earliest date {until} is after start date {from}"
        )));
    }

    let mut urls = Vec::new();
    let mut date = from;
    loop {
        urls.push(schema.replacen("{}", &style.render(date), 1));
        if date == until {
            break;
        }
        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
    }
    Ok(urls)
}
