//! Literal parsing for the Forthic interpreter
//!
//! This module provides literal parsing functions that convert string tokens into typed values.
//! These handlers are used by the Forthic interpreter to recognize and parse different literal types.
//!
//! Built-in literal types:
//! - Boolean: TRUE, FALSE
//! - Integer: 42, -10, 0
//! - Float: 3.14, -2.5, 0.0
//! - Date: 2020-06-05, YYYY-MM-DD (with wildcards)
//! - ZonedDateTime: ISO 8601 timestamps with timezone support (RFC 9557 bracketed zones included)
//!
//! There is no bare time-of-day literal (`14:30`): the value model carries a single `DateTime`
//! case with no separate time-only payload, so a time lacking a date has nowhere to live. Build
//! one with `>DATETIME` in the datetime module instead.

use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::HashMap;

/// A calendar date and time, always naive: the timezone used to resolve a literal or wildcard
/// is consulted only at parse time and is never retained on the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForthicDateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl ForthicDateTime {
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn date_only(year: i32, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }
}

/// Core value type for Forthic
#[derive(Debug, Clone, PartialEq)]
pub enum ForthicValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<ForthicValue>),
    Record(HashMap<String, ForthicValue>),
    DateTime(ForthicDateTime),
}

impl ForthicValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ForthicValue::Null)
    }

    /// Convert to string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ForthicValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to integer if possible
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ForthicValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to float if possible
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ForthicValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ForthicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness per the language's value discipline: null is false, numbers are
    /// nonzero, strings/arrays/records are nonempty, datetime is always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            ForthicValue::Null => false,
            ForthicValue::Bool(b) => *b,
            ForthicValue::Int(i) => *i != 0,
            ForthicValue::Float(f) => *f != 0.0,
            ForthicValue::String(s) => !s.is_empty(),
            ForthicValue::Array(a) => !a.is_empty(),
            ForthicValue::Record(r) => !r.is_empty(),
            ForthicValue::DateTime(_) => true,
        }
    }

    /// Numeric equality coerces int/float via a float comparison within machine epsilon;
    /// every other cross-kind comparison is false.
    pub fn forthic_eq(&self, other: &ForthicValue) -> bool {
        match (self, other) {
            (ForthicValue::Int(a), ForthicValue::Int(b)) => a == b,
            (ForthicValue::Float(a), ForthicValue::Float(b)) => (a - b).abs() < f64::EPSILON,
            (ForthicValue::Int(a), ForthicValue::Float(b))
            | (ForthicValue::Float(b), ForthicValue::Int(a)) => {
                (*a as f64 - b).abs() < f64::EPSILON
            }
            _ => self == other,
        }
    }
}

/// Literal handler function type
///
/// Takes a string and returns a parsed ForthicValue or None if can't parse
pub type LiteralHandler = fn(&str) -> Option<ForthicValue>;

/// Parse boolean literals: TRUE, FALSE
///
/// # Examples
///
/// ```
/// use forthic::literals::to_bool;
///
/// assert!(to_bool("TRUE").is_some());
/// assert!(to_bool("FALSE").is_some());
/// assert!(to_bool("true").is_none());
/// ```
pub fn to_bool(s: &str) -> Option<ForthicValue> {
    match s {
        "TRUE" => Some(ForthicValue::Bool(true)),
        "FALSE" => Some(ForthicValue::Bool(false)),
        _ => None,
    }
}

/// Parse float literals: 3.14, -2.5, 0.0
///
/// Must contain a decimal point to be recognized as a float.
pub fn to_float(s: &str) -> Option<ForthicValue> {
    if !s.contains('.') {
        return None;
    }

    s.parse::<f64>().ok().map(ForthicValue::Float)
}

/// Parse integer literals: 42, -10, 0
///
/// Must not contain a decimal point, and its re-serialization must equal the input
/// (rejects things like "007" or "42abc").
pub fn to_int(s: &str) -> Option<ForthicValue> {
    if s.contains('.') {
        return None;
    }

    let result = s.parse::<i64>().ok()?;

    if result.to_string() != s {
        return None;
    }

    Some(ForthicValue::Int(result))
}

/// Create a date literal parser with timezone support
///
/// Parses dates in format: YYYY-MM-DD
/// Supports wildcards: YYYY, MM, DD which use current values from the timezone.
/// The hour/minute/second fields of the resulting DateTime are zero.
pub fn to_literal_date(timezone: &str) -> impl Fn(&str) -> Option<ForthicValue> + '_ {
    move |s: &str| {
        let re = Regex::new(r"^(\d{4}|YYYY)-(\d{2}|MM)-(\d{2}|DD)$").ok()?;
        let caps = re.captures(s)?;

        let tz: Tz = timezone.parse().ok()?;
        let now = Utc::now().with_timezone(&tz);

        let year = match caps.get(1)?.as_str() {
            "YYYY" => now.year(),
            y => y.parse::<i32>().ok()?,
        };

        let month = match caps.get(2)?.as_str() {
            "MM" => now.month(),
            m => m.parse::<u32>().ok()?,
        };

        let day = match caps.get(3)?.as_str() {
            "DD" => now.day(),
            d => d.parse::<u32>().ok()?,
        };

        NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
        Some(ForthicValue::DateTime(ForthicDateTime::date_only(
            year,
            month as u8,
            day as u8,
        )))
    }
}

/// Create a zoned datetime literal parser with timezone support
///
/// Parses RFC 9557 / ISO 8601 datetime strings:
/// - With UTC: 2025-05-24T10:15:00Z
/// - With offset: 2025-05-24T10:15:00-05:00
/// - With bracketed IANA zone: 2025-05-24T10:15:00[America/Los_Angeles]
/// - Without any timezone marker: 2025-05-24T10:15:00 (uses the `timezone` argument)
///
/// The timezone is consulted only to resolve the wall-clock instant; the returned value
/// carries no timezone of its own.
pub fn to_zoned_datetime(timezone: &str) -> impl Fn(&str) -> Option<ForthicValue> + '_ {
    move |s: &str| {
        if !s.contains('T') {
            return None;
        }

        let tz: Tz = timezone.parse().ok()?;

        // Strip a trailing bracketed IANA zone, e.g. "...00[America/Los_Angeles]", using
        // the bracketed zone in place of the default timezone argument.
        let (body, bracket_tz) = if let Some(start) = s.find('[') {
            if !s.ends_with(']') {
                return None;
            }
            let zone_name = &s[start + 1..s.len() - 1];
            (&s[..start], zone_name.parse::<Tz>().ok())
        } else {
            (s, None)
        };
        let tz = bracket_tz.unwrap_or(tz);

        if body.ends_with('Z') {
            let dt = chrono::DateTime::parse_from_rfc3339(body).ok()?;
            let local = dt.with_timezone(&tz);
            return Some(ForthicValue::DateTime(ForthicDateTime::new(
                local.year(),
                local.month() as u8,
                local.day() as u8,
                local.hour() as u8,
                local.minute() as u8,
                local.second() as u8,
            )));
        }

        let offset_re = Regex::new(r"[+-]\d{2}:\d{2}$").ok()?;
        if offset_re.is_match(body) {
            let dt = chrono::DateTime::parse_from_rfc3339(body).ok()?;
            let local = dt.with_timezone(&tz);
            return Some(ForthicValue::DateTime(ForthicDateTime::new(
                local.year(),
                local.month() as u8,
                local.day() as u8,
                local.hour() as u8,
                local.minute() as u8,
                local.second() as u8,
            )));
        }

        let naive_dt = chrono::NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S").ok()?;
        let local = tz.from_local_datetime(&naive_dt).earliest()?;
        Some(ForthicValue::DateTime(ForthicDateTime::new(
            local.year(),
            local.month() as u8,
            local.day() as u8,
            local.hour() as u8,
            local.minute() as u8,
            local.second() as u8,
        )))
    }
}
