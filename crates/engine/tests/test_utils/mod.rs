#![allow(dead_code)]

use std::sync::Arc;

use chrono::Weekday;
use clinicsched_core::models::{
    clock::TimeWindow,
    operating_hours::OperatingHoursEntry,
    slot_type::{SlotCategory, SlotType, SlotTypeId},
    weekday::WeekdaySet,
};
use clinicsched_engine::{EditPolicy, OperatingHoursStore, ScheduleEngine, SlotTypeStore};
use clinicsched_gateway::{ConfigSyncGateway, mock::InMemoryGateway};
use rust_decimal::Decimal;

pub fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
}

pub fn slot_id(id: &str) -> SlotTypeId {
    SlotTypeId(id.to_string())
}

/// Regular 10:00-12:00 consultation, bookable, 150.00.
pub fn consultation() -> SlotType {
    SlotType {
        id: slot_id("st-consult"),
        label: "Consultation".to_string(),
        category: SlotCategory::Regular,
        window: window("10:00", "12:00"),
        price: Decimal::new(15000, 2),
        allow_booking: true,
        days: WeekdaySet::new(),
    }
}

/// Recurring day-off type labelled the legacy way.
pub fn weekoff(days: &[Weekday]) -> SlotType {
    SlotType {
        id: slot_id("st-weekoff"),
        label: "Weekoff".to_string(),
        category: SlotCategory::RecurringDayOff,
        window: window("09:00", "13:00"),
        price: Decimal::ZERO,
        allow_booking: true,
        days: days.iter().copied().collect(),
    }
}

pub fn standard_hours() -> Vec<OperatingHoursEntry> {
    InMemoryGateway::standard_week()
}

pub fn in_memory(slot_types: Vec<SlotType>) -> Arc<InMemoryGateway> {
    Arc::new(InMemoryGateway::new(standard_hours(), slot_types))
}

pub fn as_gateway(gateway: &Arc<InMemoryGateway>) -> Arc<dyn ConfigSyncGateway> {
    gateway.clone()
}

pub async fn loaded_hours(
    gateway: &Arc<InMemoryGateway>,
    policy: EditPolicy,
) -> OperatingHoursStore {
    let store = OperatingHoursStore::with_policy(as_gateway(gateway), policy);
    store.load().await.unwrap();
    store
}

pub async fn loaded_slot_types(
    gateway: &Arc<InMemoryGateway>,
    policy: EditPolicy,
) -> SlotTypeStore {
    let store = SlotTypeStore::with_policy(as_gateway(gateway), policy);
    store.load().await.unwrap();
    store
}

pub async fn loaded_engine(gateway: &Arc<InMemoryGateway>) -> ScheduleEngine {
    let engine = ScheduleEngine::new(as_gateway(gateway));
    engine.load_all().await.unwrap();
    engine
}
