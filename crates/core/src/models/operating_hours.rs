use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::clock::{ClockTime, TimeWindow};

/// Identifier assigned by the clinic settings service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The clinic's opening window on one weekday.
///
/// Entries are seeded by the service, one per weekday, and are never created
/// or deleted by clients. Only `window` and `enabled` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHoursEntry {
    pub id: EntryId,
    pub day: Weekday,
    #[serde(flatten)]
    pub window: TimeWindow,
    #[serde(rename = "is_enabled")]
    pub enabled: bool,
}

impl OperatingHoursEntry {
    pub fn is_open_at(&self, time: ClockTime) -> bool {
        self.enabled && self.window.contains_time(time)
    }
}

/// Body of an operating-hours update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHoursUpdate {
    #[serde(flatten)]
    pub window: TimeWindow,
    pub is_enabled: bool,
}

impl From<&OperatingHoursEntry> for OperatingHoursUpdate {
    fn from(entry: &OperatingHoursEntry) -> Self {
        OperatingHoursUpdate {
            window: entry.window,
            is_enabled: entry.enabled,
        }
    }
}
