use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::errors::{ScheduleError, ScheduleResult};
use crate::time_codec;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day with minute precision, stored as minutes since midnight.
///
/// The canonical text form is 24-hour `HH:MM`; see [`time_codec`] for the
/// 12-hour display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(ClockTime(u16::from(hour) * 60 + u16::from(minute)))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(ClockTime(minutes))
    }

    pub fn hour(&self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.0 % 60) as u8
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time_codec::parse_internal(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // The service may hand back SQL TIME values with a seconds component.
        let trimmed = match raw.rsplit_once(':') {
            Some((head, "00")) if head.contains(':') => head,
            _ => raw.as_str(),
        };
        time_codec::parse_internal(trimmed).map_err(de::Error::custom)
    }
}

/// A same-day `[start, end)` interval. Windows never wrap past midnight.
///
/// Deserializing rejects `start >= end`, so a window read off the wire always
/// satisfies [`TimeWindow::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    #[serde(rename = "start_time")]
    pub start: ClockTime,
    #[serde(rename = "end_time")]
    pub end: ClockTime,
}

#[derive(Deserialize)]
struct RawWindow {
    start_time: ClockTime,
    end_time: ClockTime,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = ScheduleError;

    fn try_from(raw: RawWindow) -> ScheduleResult<Self> {
        TimeWindow::new(raw.start_time, raw.end_time)
    }
}

impl TimeWindow {
    /// Builds a window, rejecting `start >= end`.
    pub fn new(start: ClockTime, end: ClockTime) -> ScheduleResult<Self> {
        let window = TimeWindow { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(ScheduleError::Validation(format!(
                "end time {} must be after start time {}",
                self.end, self.start
            )))
        }
    }

    pub fn contains_time(&self, time: ClockTime) -> bool {
        self.start <= time && time < self.end
    }

    /// True when `other` lies entirely inside this window.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes_since_midnight().saturating_sub(self.start.minutes_since_midnight())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
