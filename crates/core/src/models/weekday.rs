use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser::SerializeSeq};

use crate::errors::{ScheduleError, ScheduleResult};

/// The seven weekdays in canonical Mon→Sun order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Short label used on the wire and in the UI (`Mon`…`Sun`).
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parses a short or full weekday name, case-insensitively.
pub fn parse_weekday(label: &str) -> ScheduleResult<Weekday> {
    label
        .trim()
        .parse::<Weekday>()
        .map_err(|_| ScheduleError::Validation(format!("unknown weekday '{}'", label)))
}

/// An unordered subset of the seven weekdays.
///
/// Storage order never matters: equality is set equality and [`to_list`]
/// always yields canonical Mon→Sun order.
///
/// [`to_list`]: WeekdaySet::to_list
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        WeekdaySet(0)
    }

    pub fn all() -> Self {
        WEEK.into_iter().collect()
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    /// Returns true if the day was not already present.
    pub fn add(&mut self, day: Weekday) -> bool {
        let absent = !self.contains(day);
        self.0 |= Self::bit(day);
        absent
    }

    /// Returns true if the day was present.
    pub fn remove(&mut self, day: Weekday) -> bool {
        let present = self.contains(day);
        self.0 &= !Self::bit(day);
        present
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }

    pub fn to_list(&self) -> Vec<Weekday> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Weekday> for WeekdaySet {
    fn extend<I: IntoIterator<Item = Weekday>>(&mut self, iter: I) {
        for day in iter {
            self.add(day);
        }
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(weekday_label)).finish()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().map(weekday_label).collect();
        f.write_str(&labels.join(", "))
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for day in self.iter() {
            seq.serialize_element(weekday_label(day))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let labels = Vec::<String>::deserialize(deserializer)?;
        labels
            .iter()
            .map(|label| parse_weekday(label).map_err(de::Error::custom))
            .collect()
    }
}
