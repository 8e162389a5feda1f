//! Show time extraction from emoji-tagged issue bodies.
//!
//! Show issues carry two tagged lines:
//!
//! ```text
//! 📅 Thursday, August 19, 2021
//! 🕐 10:00am Pacific Time (other time zones)
//! ```
//!
//! The clock value is read as a 24-hour `H:mm` string after the am/pm suffix
//! is dropped, so afternoon shows come back with a low hour. Hours below the
//! low-hour threshold are shifted by twelve hours; shows never start in the
//! early morning.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Month, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

pub const CALENDAR_MARKER: &str = "📅";
pub const CLOCK_MARKER: &str = "🕐";
pub const DEFAULT_LOW_HOUR_THRESHOLD: u32 = 8;
const TIME_ZONE_LABEL: &str = "Pacific Time";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failures raised while reading a show time out of an issue body.
pub enum ShowTimeError {
    #[error("show body has no line tagged with 📅")]
    MissingDateLine,
    #[error("show body has no line tagged with 🕐")]
    MissingTimeLine,
    #[error("invalid show date '{0}', expected 'Month D, YYYY'")]
    InvalidDate(String),
    #[error("invalid show time '{0}', expected 'H:mm' with optional am/pm suffix")]
    InvalidTime(String),
    #[error("local show time {local} does not exist in {time_zone}")]
    NonexistentLocalTime { local: String, time_zone: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Date, disambiguated wall-clock time, and the absolute instant of a show.
pub struct ParsedShowTime {
    pub calendar_date: NaiveDate,
    pub local_time: NaiveTime,
    pub resolved_instant: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowTimeParser {
    pub time_zone: Tz,
    pub low_hour_threshold: u32,
}

impl Default for ShowTimeParser {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::America::Los_Angeles,
            low_hour_threshold: DEFAULT_LOW_HOUR_THRESHOLD,
        }
    }
}

impl ShowTimeParser {
    pub fn new(time_zone: Tz, low_hour_threshold: u32) -> Self {
        Self {
            time_zone,
            low_hour_threshold,
        }
    }

    pub fn parse(&self, body: &str) -> Result<ParsedShowTime, ShowTimeError> {
        let date_text = extract_date_text(body).ok_or(ShowTimeError::MissingDateLine)?;
        let time_text = extract_time_text(body).ok_or(ShowTimeError::MissingTimeLine)?;
        let calendar_date = parse_long_date(&date_text)?;
        let parsed_time = parse_clock_time(&time_text)?;
        let local_time = self.disambiguate(parsed_time);

        let local = NaiveDateTime::new(calendar_date, local_time);
        let resolved = self
            .time_zone
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| ShowTimeError::NonexistentLocalTime {
                local: local.to_string(),
                time_zone: self.time_zone.name().to_string(),
            })?;

        Ok(ParsedShowTime {
            calendar_date,
            local_time,
            resolved_instant: resolved.with_timezone(&Utc),
        })
    }

    /// Shifts hours below the threshold into the afternoon.
    pub fn disambiguate(&self, time: NaiveTime) -> NaiveTime {
        if chrono::Timelike::hour(&time) < self.low_hour_threshold {
            let (shifted, _) = time.overflowing_add_signed(Duration::hours(12));
            shifted
        } else {
            time
        }
    }
}

fn calendar_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"📅[^\r\n]*").expect("calendar line pattern compiles"))
}

fn clock_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"🕐[^(\r\n]*").expect("clock line pattern compiles"))
}

fn weekday_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\w+, ").expect("weekday prefix pattern compiles"))
}

fn meridiem_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(am|pm)\b").expect("meridiem pattern compiles"))
}

fn extract_date_text(body: &str) -> Option<String> {
    let line = calendar_line_pattern().find(body)?.as_str();
    let value = line.trim_start_matches(CALENDAR_MARKER).trim_start();
    let value = weekday_prefix_pattern().replace(value, "");
    Some(value.trim().to_string())
}

fn extract_time_text(body: &str) -> Option<String> {
    let line = clock_line_pattern().find(body)?.as_str();
    let value = line
        .trim_start_matches(CLOCK_MARKER)
        .trim_start()
        .replacen(TIME_ZONE_LABEL, "", 1);
    Some(value.trim().to_string())
}

fn parse_long_date(value: &str) -> Result<NaiveDate, ShowTimeError> {
    let invalid = || ShowTimeError::InvalidDate(value.to_string());
    let (month_name, rest) = value.split_once(' ').ok_or_else(invalid)?;
    let (day, year) = rest.split_once(", ").ok_or_else(invalid)?;
    if day.is_empty() || day.len() > 2 || !day.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    if year.len() != 4 || !year.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    let month = month_name.parse::<Month>().map_err(|_| invalid())?;
    if month.name() != month_name {
        return Err(invalid());
    }
    let day = day.parse::<u32>().map_err(|_| invalid())?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month.number_from_month(), day).ok_or_else(invalid)
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, ShowTimeError> {
    let invalid = || ShowTimeError::InvalidTime(value.to_string());
    let stripped = meridiem_suffix_pattern().replace(value, "");
    let stripped = stripped.trim();
    let (hour, minute) = stripped.split_once(':').ok_or_else(invalid)?;
    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    if minute.len() != 2 || !minute.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    let hour = hour.parse::<u32>().map_err(|_| invalid())?;
    let minute = minute.parse::<u32>().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
