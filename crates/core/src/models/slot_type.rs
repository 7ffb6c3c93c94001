use std::fmt;

use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::clock::TimeWindow;
use super::weekday::WeekdaySet;
use crate::errors::{ScheduleError, ScheduleResult};

/// Label token that marked a recurring day-off type before categories were
/// sent explicitly.
pub const LEGACY_DAY_OFF_TOKEN: &str = "weekoff";

/// Identifier assigned by the clinic settings service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotTypeId(pub String);

impl fmt::Display for SlotTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    #[default]
    Regular,
    /// Applies only on the weekdays in the slot type's day set.
    RecurringDayOff,
}

impl SlotCategory {
    /// Category for payloads that predate the explicit tag.
    pub fn infer_from_label(label: &str) -> Self {
        if label.to_lowercase().contains(LEGACY_DAY_OFF_TOKEN) {
            SlotCategory::RecurringDayOff
        } else {
            SlotCategory::Regular
        }
    }

    pub fn uses_days(&self) -> bool {
        matches!(self, SlotCategory::RecurringDayOff)
    }
}

/// A named, priced appointment category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlotTypePayload")]
pub struct SlotType {
    pub id: SlotTypeId,
    pub label: String,
    pub category: SlotCategory,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub price: Decimal,
    pub allow_booking: bool,
    pub days: WeekdaySet,
}

impl SlotType {
    pub fn from_fields(id: SlotTypeId, fields: SlotTypeFields) -> Self {
        SlotType {
            id,
            label: fields.label,
            category: fields.category,
            window: fields.window,
            price: fields.price,
            allow_booking: fields.allow_booking,
            days: fields.days,
        }
    }

    pub fn fields(&self) -> SlotTypeFields {
        SlotTypeFields {
            label: self.label.clone(),
            category: self.category,
            window: self.window,
            price: self.price,
            allow_booking: self.allow_booking,
            days: self.days,
        }
    }

    /// Regular types apply every day; day-off types only on their listed days.
    pub fn applies_on(&self, day: Weekday) -> bool {
        match self.category {
            SlotCategory::Regular => true,
            SlotCategory::RecurringDayOff => self.days.contains(day),
        }
    }
}

/// Wire shape of a slot type, where `category` may be missing.
#[derive(Deserialize)]
struct SlotTypePayload {
    id: SlotTypeId,
    label: String,
    category: Option<SlotCategory>,
    #[serde(flatten)]
    window: TimeWindow,
    price: Decimal,
    allow_booking: bool,
    #[serde(default)]
    days: WeekdaySet,
}

impl From<SlotTypePayload> for SlotType {
    fn from(payload: SlotTypePayload) -> Self {
        let category = payload
            .category
            .unwrap_or_else(|| SlotCategory::infer_from_label(&payload.label));
        SlotType {
            id: payload.id,
            label: payload.label,
            category,
            window: payload.window,
            price: payload.price,
            allow_booking: payload.allow_booking,
            days: payload.days,
        }
    }
}

/// Body of a slot-type create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTypeFields {
    pub label: String,
    pub category: SlotCategory,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub price: Decimal,
    pub allow_booking: bool,
    #[serde(default)]
    pub days: WeekdaySet,
}

/// Fields for a slot type created through an explicit add.
pub type NewSlotType = SlotTypeFields;

impl SlotTypeFields {
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.label.trim().is_empty() {
            return Err(ScheduleError::Validation("label must not be empty".into()));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ScheduleError::Validation(format!(
                "price must not be negative (got {})",
                self.price
            )));
        }
        self.window.validate()
    }

    /// Drops the day set for categories that ignore it and trims the label.
    pub fn normalized(mut self) -> Self {
        self.label = self.label.trim().to_string();
        if !self.category.uses_days() {
            self.days = WeekdaySet::new();
        }
        self
    }
}
