//! # Time Codec
//!
//! Conversion between the internal 24-hour `HH:MM` form and the 12-hour
//! `HH:MM AM/PM` display form.
//!
//! The lenient [`encode`] and [`decode`] functions never fail: rows that are
//! only partially loaded still have to render, so malformed or empty input maps
//! to a fixed placeholder. The `parse_*` functions are the strict variants used
//! when a row is validated before saving.
//!
//! ```
//! use clinicsched_core::time_codec::{decode, encode};
//!
//! assert_eq!(encode("00:00"), "12:00 AM");
//! assert_eq!(encode("13:05"), "01:05 PM");
//! assert_eq!(decode("12:00 PM"), "12:00");
//! assert_eq!(decode(""), "--:-- --");
//! ```

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::clock::ClockTime;

/// Rendered in place of a time that could not be converted, in either direction.
pub const PLACEHOLDER: &str = "--:-- --";

/// Internal `HH:MM` to display `HH:MM AM/PM`.
pub fn encode(internal: &str) -> String {
    match parse_internal(internal) {
        Ok(time) => to_display(time),
        Err(_) => PLACEHOLDER.to_string(),
    }
}

/// Display `HH:MM AM/PM` to internal `HH:MM`.
pub fn decode(display: &str) -> String {
    match parse_display(display) {
        Ok(time) => time.to_string(),
        Err(_) => PLACEHOLDER.to_string(),
    }
}

pub fn to_display(time: ClockTime) -> String {
    let hour = time.hour();
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = (hour + 11) % 12 + 1;
    format!("{:02}:{:02} {}", display_hour, time.minute(), suffix)
}

/// Strictly parses the internal 24-hour form. The hour may be unpadded.
pub fn parse_internal(input: &str) -> ScheduleResult<ClockTime> {
    let (hour, minute) = split_hm(input.trim()).ok_or_else(|| malformed(input))?;
    if hour > 23 {
        return Err(malformed(input));
    }
    ClockTime::from_hm(hour, minute).ok_or_else(|| malformed(input))
}

/// Strictly parses the 12-hour display form.
///
/// The suffix is case-insensitive and the space before it is optional, so
/// `9:05pm` is accepted and normalizes to `09:05 PM` when encoded again.
pub fn parse_display(input: &str) -> ScheduleResult<ClockTime> {
    let upper = input.trim().to_ascii_uppercase();
    let (clock, is_pm) = if let Some(clock) = upper.strip_suffix("PM") {
        (clock, true)
    } else if let Some(clock) = upper.strip_suffix("AM") {
        (clock, false)
    } else {
        return Err(malformed(input));
    };

    let (h12, minute) = split_hm(clock.trim_end()).ok_or_else(|| malformed(input))?;
    if !(1..=12).contains(&h12) {
        return Err(malformed(input));
    }

    let hour = match (is_pm, h12) {
        (true, h) if h < 12 => h + 12,
        (false, 12) => 0,
        (_, h) => h,
    };
    ClockTime::from_hm(hour, minute).ok_or_else(|| malformed(input))
}

/// Accepts either representation; anything ending in `AM`/`PM` is display form.
pub fn parse_flexible(input: &str) -> ScheduleResult<ClockTime> {
    let upper = input.trim().to_ascii_uppercase();
    if upper.ends_with("AM") || upper.ends_with("PM") {
        parse_display(input)
    } else {
        parse_internal(input)
    }
}

fn split_hm(clock: &str) -> Option<(u8, u8)> {
    let (hours, minutes) = clock.split_once(':')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hours) || hours.len() > 2 || !digits(minutes) || minutes.len() != 2 {
        return None;
    }
    let minute: u8 = minutes.parse().ok()?;
    if minute > 59 {
        return None;
    }
    Some((hours.parse().ok()?, minute))
}

fn malformed(input: &str) -> ScheduleError {
    ScheduleError::Validation(format!("malformed time value '{}'", input))
}
