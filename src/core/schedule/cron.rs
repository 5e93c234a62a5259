//! Cron expressions and job time zones
//!
//! Expressions are the usual five fields (`M H DoM Mon DoW`) and are handed
//! to [`cron::Schedule`] with a leading seconds field; six or seven field
//! expressions pass through unchanged. Weekdays are names (`MON`) or `1-7`
//! with Sunday as 1.
//!
//! Time zones are IANA names (`Europe/Oslo`, `UTC`) or fixed offsets in the
//! `GMT+1:00` spelling the deployed jobs use.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

/// A parsed cron schedule
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// Parses a cron expression
    ///
    /// # Examples
    ///
    /// ```
    /// use cristin_sync::core::schedule::cron::CronSchedule;
    ///
    /// let schedule = CronSchedule::parse("30 0 * * *").unwrap();
    /// assert_eq!(schedule.time_label(), "00:30");
    ///
    /// assert!(CronSchedule::parse("30 0 * *").is_err());
    /// ```
    pub fn parse(expression: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let with_seconds = match fields.len() {
            5 => format!("0 {}", fields.join(" ")),
            6 | 7 => fields.join(" "),
            n => {
                return Err(format!(
                    "Cron expression '{expression}' must have 5 fields, got {n}"
                ))
            }
        };

        let schedule = Schedule::from_str(&with_seconds)
            .map_err(|e| format!("Invalid cron expression '{expression}': {e}"))?;

        Ok(Self {
            expression: fields.join(" "),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// `HH:MM` when hour and minute are fixed, otherwise the raw fields
    pub fn time_label(&self) -> String {
        let fields: Vec<&str> = self.expression.split_whitespace().collect();
        let (minute, hour) = match fields.len() {
            5 => (fields[0], fields[1]),
            _ => (fields[1], fields[2]),
        };

        match (hour.parse::<u32>(), minute.parse::<u32>()) {
            (Ok(h), Ok(m)) => format!("{h:02}:{m:02}"),
            _ => format!("{hour}:{minute}"),
        }
    }

    /// First firing strictly after `after`, evaluated in `tz`
    pub fn next_after(&self, after: DateTime<Utc>, tz: &JobTimeZone) -> Option<DateTime<Utc>> {
        match tz {
            JobTimeZone::Fixed(offset) => self.first_after(&after.with_timezone(offset)),
            JobTimeZone::Named(zone) => self.first_after(&after.with_timezone(zone)),
        }
    }

    fn first_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(after)
            .next()
            .map(|at| at.with_timezone(&Utc))
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Time zone a job's cron expression is evaluated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTimeZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl JobTimeZone {
    /// UTC offset in effect at `at`
    pub fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset {
        match self {
            JobTimeZone::Fixed(offset) => *offset,
            JobTimeZone::Named(zone) => at.with_timezone(zone).offset().fix(),
        }
    }
}

impl fmt::Display for JobTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobTimeZone::Fixed(offset) => write!(f, "{offset}"),
            JobTimeZone::Named(zone) => f.write_str(zone.name()),
        }
    }
}

/// Parses a job time zone
///
/// Accepts IANA names (`Europe/Oslo`, `UTC`) and fixed offsets such as
/// `GMT+1:00`, `UTC-05:30`, `+01:00` and `+0100`.
pub fn parse_time_zone(raw: &str) -> Result<JobTimeZone, String> {
    let trimmed = raw.trim();
    if let Ok(zone) = trimmed.parse::<Tz>() {
        return Ok(JobTimeZone::Named(zone));
    }

    parse_fixed_offset(trimmed, raw).map(JobTimeZone::Fixed)
}

fn parse_fixed_offset(trimmed: &str, raw: &str) -> Result<FixedOffset, String> {
    let invalid = || format!("Invalid time zone '{raw}'. Expected e.g. Europe/Oslo or GMT+1:00");

    if !trimmed.is_ascii() {
        return Err(invalid());
    }

    let upper = trimmed.to_ascii_uppercase();
    let rest = upper
        .strip_prefix("GMT")
        .or_else(|| upper.strip_prefix("UTC"))
        .unwrap_or(&upper);

    if rest.is_empty() || rest == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, digits) = match rest.split_at(1) {
        ("+", digits) => (1, digits),
        ("-", digits) => (-1, digits),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };

    let hours: i32 = hours
        .parse()
        .map_err(|_| format!("Invalid hour offset in time zone '{raw}'"))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| format!("Invalid minute offset in time zone '{raw}'"))?;

    if hours > 14 || minutes > 59 {
        return Err(format!("Time zone offset out of range in '{raw}'"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("Time zone offset out of range in '{raw}'"))
}
