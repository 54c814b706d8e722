//! Date normalization for heterogeneous export formats.
//!
//! Strategies are tried in order until one yields a valid calendar date:
//! 1. Month-token substitution (`15 Agt 2023`) parsed as day-month-year.
//! 2. Generic calendar parse of the raw string.
//! 3. An 8-digit `YYYYMMDD` token in the source file name.
//!
//! When all three fail the date is `None` and the row is kept.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Indonesian three-letter month abbreviations.
pub const MONTH_TOKENS: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("mei", 5),
    ("jun", 6),
    ("jul", 7),
    ("agt", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("des", 12),
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Which strategy produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStrategy {
    MonthToken,
    Generic,
    SourceFileName,
}

pub struct DateNormalizer;

impl DateNormalizer {
    /// Canonical date for a raw value, falling back to the source file name.
    pub fn normalize(raw: &str, source_file: &str) -> Option<NaiveDate> {
        Self::resolve(raw, source_file).map(|(date, _)| date)
    }

    /// Like `normalize`, also reporting which strategy succeeded.
    pub fn resolve(raw: &str, source_file: &str) -> Option<(NaiveDate, DateStrategy)> {
        let raw = raw.trim();
        if !raw.is_empty() {
            if let Some(d) = parse_month_token(raw) {
                return Some((d, DateStrategy::MonthToken));
            }
            if let Some(d) = parse_generic(raw) {
                return Some((d, DateStrategy::Generic));
            }
        }
        date_from_file_name(source_file).map(|d| (d, DateStrategy::SourceFileName))
    }
}

fn month_from_token(token: &str) -> Option<u32> {
    if token.len() != 3 {
        return None;
    }
    let lower = token.to_ascii_lowercase();
    MONTH_TOKENS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, m)| *m)
}

/// Strategy 1: substitute the month token, then read day-month-year.
pub fn parse_month_token(raw: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '/' | '.' | ','))
        .filter(|t| !t.is_empty())
        .collect();

    let month_pos = tokens.iter().position(|t| month_from_token(t).is_some())?;
    if month_pos != 1 || tokens.len() < 3 {
        return None;
    }

    let day: u32 = tokens[0].parse().ok()?;
    let month = month_from_token(tokens[1])?;
    let year_token = tokens[2];
    let mut year: i32 = year_token.parse().ok()?;
    if year_token.len() == 2 {
        year += 2000;
    } else if year_token.len() != 4 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Strategy 2: best-effort parse against common calendar layouts.
pub fn parse_generic(raw: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

fn file_date_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Strategy 3: first valid `YYYYMMDD` token in a file name. Only digit runs
/// of exactly eight characters qualify.
pub fn date_from_file_name(source_file: &str) -> Option<NaiveDate> {
    file_date_pattern()?
        .find_iter(source_file)
        .filter(|m| m.as_str().len() == 8)
        .find_map(|m| NaiveDate::parse_from_str(m.as_str(), "%Y%m%d").ok())
}
