mod test_utils;

use chrono::Weekday;
use clinicsched_core::{ScheduleError, models::slot_type::SlotType};
use clinicsched_engine::ScheduleEngine;
use clinicsched_gateway::mock::GatewayOp;
use pretty_assertions::assert_eq;

use crate::test_utils::{
    as_gateway, consultation, in_memory, loaded_engine, slot_id, weekoff, window,
};

fn catalogue() -> Vec<SlotType> {
    let mut evening = consultation();
    evening.id = slot_id("st-evening");
    evening.label = "Evening".to_string();
    evening.window = window("18:00", "20:00");

    let mut blocked = consultation();
    blocked.id = slot_id("st-blocked");
    blocked.label = "Blocked".to_string();
    blocked.allow_booking = false;

    vec![consultation(), evening, blocked, weekoff(&[Weekday::Sat])]
}

fn ids(slot_types: Vec<SlotType>) -> Vec<String> {
    slot_types.into_iter().map(|slot_type| slot_type.id.0).collect()
}

#[tokio::test]
async fn test_load_all_fills_both_collections() {
    let gateway = in_memory(catalogue());
    let engine = loaded_engine(&gateway).await;

    assert_eq!(engine.operating_hours().entries().await.len(), 7);
    assert_eq!(engine.slot_types().slot_types().await.len(), 4);
    assert_eq!(gateway.calls(GatewayOp::ListOperatingHours).await, 1);
    assert_eq!(gateway.calls(GatewayOp::ListSlotTypes).await, 1);
}

#[tokio::test]
async fn test_load_all_reports_failure_but_keeps_other_collection() {
    let gateway = in_memory(catalogue());
    gateway.fail_next(GatewayOp::ListSlotTypes, 1).await;
    let engine = ScheduleEngine::new(as_gateway(&gateway));

    let err = engine.load_all().await.unwrap_err();

    assert!(matches!(err, ScheduleError::Sync(_)));
    assert_eq!(engine.operating_hours().entries().await.len(), 7);
    assert!(engine.slot_types().slot_types().await.is_empty());
}

#[tokio::test]
async fn test_bookable_slot_types_follow_hours_and_days() {
    let gateway = in_memory(catalogue());
    let engine = loaded_engine(&gateway).await;

    assert_eq!(ids(engine.bookable_slot_types(Weekday::Mon).await), vec!["st-consult"]);
    assert_eq!(
        ids(engine.bookable_slot_types(Weekday::Sat).await),
        vec!["st-consult", "st-weekoff"]
    );
    // closed on Sunday
    assert!(engine.bookable_slot_types(Weekday::Sun).await.is_empty());

    engine.operating_hours().toggle_enabled(Weekday::Sun).await.unwrap();
    assert_eq!(ids(engine.bookable_slot_types(Weekday::Sun).await), vec!["st-consult"]);
}

#[tokio::test]
async fn test_bookable_slot_types_track_window_edits() {
    let gateway = in_memory(catalogue());
    let engine = loaded_engine(&gateway).await;
    let hours = engine.operating_hours();

    hours
        .set_window(Weekday::Mon, clinicsched_engine::WindowField::Start, "11:00")
        .await
        .unwrap();
    // drafts do not count until saved
    assert_eq!(ids(engine.bookable_slot_types(Weekday::Mon).await), vec!["st-consult"]);

    hours.save(Weekday::Mon).await.unwrap();
    assert!(engine.bookable_slot_types(Weekday::Mon).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_cancel_in_flight_reaches_both_stores() {
    let gateway = in_memory(catalogue());
    let engine = loaded_engine(&gateway).await;
    let hold = gateway.hold(GatewayOp::DeleteSlotType).await;

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.slot_types().delete(&slot_id("st-blocked")).await }
    });
    hold.entered().await;
    engine.cancel_in_flight().await;

    assert!(matches!(
        pending.await.unwrap(),
        Err(ScheduleError::Cancelled)
    ));
    assert!(engine.slot_types().slot_type(&slot_id("st-blocked")).await.is_some());
    assert_eq!(gateway.slot_types().await.len(), 4);
}

#[tokio::test]
async fn test_cancelled_load_all_reports_cancelled() {
    let gateway = in_memory(catalogue());
    let engine = ScheduleEngine::new(as_gateway(&gateway));
    let hold = gateway.hold(GatewayOp::ListSlotTypes).await;

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.load_all().await }
    });
    hold.entered().await;
    engine.cancel_in_flight().await;

    assert!(matches!(
        pending.await.unwrap(),
        Err(ScheduleError::Cancelled)
    ));
    assert!(engine.slot_types().slot_types().await.is_empty());
    assert_eq!(engine.operating_hours().entries().await.len(), 7);
}
