// Copyright (c) 2025 - Cowboy AI, Inc.
//! Backup and Maintenance Window Value Objects
//!
//! Both windows are expressed in UTC. A backup window repeats daily
//! (`hh:mm-hh:mm`), a maintenance window weekly (`ddd:hh:mm-ddd:hh:mm`).
//! Windows may wrap past midnight or past the end of the week.

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MINUTES_PER_DAY: u32 = 24 * 60;
const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// Window validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid window format: {0}")]
    InvalidFormat(String),

    #[error("Invalid time of day: {0} (expected hh:mm)")]
    InvalidTime(String),

    #[error("Invalid weekday: {0} (expected mon..sun)")]
    InvalidWeekday(String),

    #[error("Window {window} lasts {minutes} minutes (minimum {minimum})")]
    TooShort {
        window: String,
        minutes: u32,
        minimum: u32,
    },
}

fn parse_time(s: &str) -> Result<NaiveTime, WindowError> {
    if s.len() != 5 {
        return Err(WindowError::InvalidTime(s.to_string()));
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| WindowError::InvalidTime(s.to_string()))
}

fn parse_weekday(s: &str) -> Result<Weekday, WindowError> {
    if s.len() != 3 || s.chars().any(|c| !c.is_ascii_lowercase()) {
        return Err(WindowError::InvalidWeekday(s.to_string()));
    }
    Weekday::from_str(s).map_err(|_| WindowError::InvalidWeekday(s.to_string()))
}

fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Half-open interval `[start, start + len)` on a circle of `period` minutes
fn cyclic_overlap(a_start: u32, a_len: u32, b_start: u32, b_len: u32, period: u32) -> bool {
    let b_from_a = (b_start + period - a_start % period) % period;
    let a_from_b = (a_start + period - b_start % period) % period;
    b_from_a < a_len || a_from_b < b_len
}

/// Daily backup window (`03:00-04:00`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackupWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl BackupWindow {
    /// Shortest window the provider accepts
    pub const MIN_MINUTES: u32 = 30;

    pub fn new(window: impl AsRef<str>) -> Result<Self, WindowError> {
        let window = window.as_ref();
        let (start, end) = window
            .split_once('-')
            .ok_or_else(|| WindowError::InvalidFormat(window.to_string()))?;

        let parsed = Self {
            start: parse_time(start)?,
            end: parse_time(end)?,
        };

        let minutes = parsed.duration_minutes();
        if minutes < Self::MIN_MINUTES {
            return Err(WindowError::TooShort {
                window: window.to_string(),
                minutes,
                minimum: Self::MIN_MINUTES,
            });
        }
        Ok(parsed)
    }

    /// Minute of the day the window opens
    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start)
    }

    /// Length in minutes, wrapping past midnight
    pub fn duration_minutes(&self) -> u32 {
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);
        (end + MINUTES_PER_DAY - start) % MINUTES_PER_DAY
    }
}

impl fmt::Display for BackupWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for BackupWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BackupWindow {
    type Error = WindowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BackupWindow> for String {
    fn from(value: BackupWindow) -> Self {
        value.to_string()
    }
}

/// Weekly maintenance window (`sun:04:00-sun:05:00`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MaintenanceWindow {
    start_day: Weekday,
    start: NaiveTime,
    end_day: Weekday,
    end: NaiveTime,
}

impl MaintenanceWindow {
    /// Shortest window the provider accepts
    pub const MIN_MINUTES: u32 = 30;

    pub fn new(window: impl AsRef<str>) -> Result<Self, WindowError> {
        let window = window.as_ref();
        let (start, end) = window
            .split_once('-')
            .ok_or_else(|| WindowError::InvalidFormat(window.to_string()))?;

        let (start_day, start_time) = start
            .split_once(':')
            .ok_or_else(|| WindowError::InvalidFormat(window.to_string()))?;
        let (end_day, end_time) = end
            .split_once(':')
            .ok_or_else(|| WindowError::InvalidFormat(window.to_string()))?;

        let parsed = Self {
            start_day: parse_weekday(start_day)?,
            start: parse_time(start_time)?,
            end_day: parse_weekday(end_day)?,
            end: parse_time(end_time)?,
        };

        let minutes = parsed.duration_minutes();
        if minutes < Self::MIN_MINUTES {
            return Err(WindowError::TooShort {
                window: window.to_string(),
                minutes,
                minimum: Self::MIN_MINUTES,
            });
        }
        Ok(parsed)
    }

    /// Minute of the week (Monday 00:00 = 0) the window opens
    pub fn start_minute(&self) -> u32 {
        self.start_day.num_days_from_monday() * MINUTES_PER_DAY + minute_of_day(self.start)
    }

    fn end_minute(&self) -> u32 {
        self.end_day.num_days_from_monday() * MINUTES_PER_DAY + minute_of_day(self.end)
    }

    /// Length in minutes, wrapping past the end of the week
    pub fn duration_minutes(&self) -> u32 {
        (self.end_minute() + MINUTES_PER_WEEK - self.start_minute()) % MINUTES_PER_WEEK
    }

    /// Whether the daily backup window intersects this window on any day
    pub fn overlaps(&self, backup: &BackupWindow) -> bool {
        (0..7).any(|day| {
            cyclic_overlap(
                self.start_minute(),
                self.duration_minutes(),
                day * MINUTES_PER_DAY + backup.start_minute(),
                backup.duration_minutes(),
                MINUTES_PER_WEEK,
            )
        })
    }
}

impl fmt::Display for MaintenanceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            weekday_token(self.start_day),
            self.start.format("%H:%M"),
            weekday_token(self.end_day),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for MaintenanceWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MaintenanceWindow {
    type Error = WindowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MaintenanceWindow> for String {
    fn from(value: MaintenanceWindow) -> Self {
        value.to_string()
    }
}
