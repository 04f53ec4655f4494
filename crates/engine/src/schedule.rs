//! Recurring weekly availability and slot resolution.
//!
//! A reader declares, per weekday, an ordered list of `HH:MM` intervals in
//! their local time. The resolver turns a concrete date plus a session
//! duration into the list of bookable start times on a 30-minute grid.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// The grid step for candidate start times, independent of the session
/// duration. Durations not divisible by 30 still yield valid slots, just
/// non-uniformly spaced within an interval.
const SLOT_GRID_MINUTES: i64 = 30;

/// One `start`–`end` window in reader-local time, both `HH:MM`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: String,
    pub end: String,
}

/// Weekly schedule keyed by lowercase weekday name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    pub days: BTreeMap<String, Vec<Interval>>,
}

/// Parses `HH:MM` into minutes since midnight.
pub fn parse_hhmm(value: &str) -> ResultEngine<i64> {
    let (hours, minutes) = value
        .split_once(':')
        .ok_or_else(|| EngineError::Validation(format!("invalid time: {value}")))?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(EngineError::Validation(format!("invalid time: {value}")));
    }
    let hours: i64 = hours
        .parse()
        .map_err(|_| EngineError::Validation(format!("invalid time: {value}")))?;
    let minutes: i64 = minutes
        .parse()
        .map_err(|_| EngineError::Validation(format!("invalid time: {value}")))?;
    if hours > 23 || minutes > 59 {
        return Err(EngineError::Validation(format!("invalid time: {value}")));
    }
    Ok(hours * 60 + minutes)
}

fn format_hhmm(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

const WEEKDAY_KEYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

impl WeeklySchedule {
    /// Checks weekday keys and interval bounds. Stored schedules are
    /// validated again on load since they arrive as free-form JSON.
    pub fn validate(&self) -> ResultEngine<()> {
        for (day, intervals) in &self.days {
            if !WEEKDAY_KEYS.contains(&day.as_str()) {
                return Err(EngineError::Validation(format!("invalid weekday: {day}")));
            }
            for interval in intervals {
                let start = parse_hhmm(&interval.start)?;
                let end = parse_hhmm(&interval.end)?;
                if start >= end {
                    return Err(EngineError::Validation(format!(
                        "interval start {} must precede end {}",
                        interval.start, interval.end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether the date's weekday has at least one configured interval.
    pub fn is_date_available(&self, date: NaiveDate) -> bool {
        self.days
            .get(weekday_key(date.weekday()))
            .is_some_and(|intervals| !intervals.is_empty())
    }

    /// Bookable `HH:MM` start times for `date`, ascending.
    ///
    /// Candidates run on the 30-minute grid from each interval's start; a
    /// candidate is kept iff `start + duration <= end`, so a session ending
    /// exactly at the interval end is valid.
    pub fn slots_for(&self, date: NaiveDate, duration_minutes: i64) -> ResultEngine<Vec<String>> {
        if duration_minutes <= 0 {
            return Err(EngineError::Validation(format!(
                "duration must be positive, got {duration_minutes}"
            )));
        }

        let Some(intervals) = self.days.get(weekday_key(date.weekday())) else {
            return Ok(Vec::new());
        };

        let mut slots = Vec::new();
        for interval in intervals {
            let start = parse_hhmm(&interval.start)?;
            let end = parse_hhmm(&interval.end)?;
            let mut candidate = start;
            while candidate + duration_minutes <= end {
                slots.push(candidate);
                candidate += SLOT_GRID_MINUTES;
            }
        }

        slots.sort_unstable();
        slots.dedup();
        Ok(slots.into_iter().map(format_hhmm).collect())
    }

    /// Whether `time` (`HH:MM`) is a valid start for a session of
    /// `duration_minutes` on `date`.
    pub fn is_slot_bookable(
        &self,
        date: NaiveDate,
        time: &str,
        duration_minutes: i64,
    ) -> ResultEngine<bool> {
        let requested = parse_hhmm(time)?;
        let slots = self.slots_for(date, duration_minutes)?;
        Ok(slots.iter().any(|slot| {
            parse_hhmm(slot).map(|minutes| minutes == requested).unwrap_or(false)
        }))
    }
}
