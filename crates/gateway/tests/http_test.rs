use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
};
use chrono::Weekday;
use clinicsched_core::{
    ScheduleError,
    models::{
        clock::TimeWindow,
        operating_hours::{EntryId, OperatingHoursUpdate},
        slot_type::{SlotCategory, SlotTypeFields, SlotTypeId},
    },
};
use clinicsched_gateway::{ConfigSyncGateway, GatewayConfig, HttpGateway};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Mutex};
use tokio_util::sync::CancellationToken;

const TOKEN: &str = "session-token";

#[derive(Default)]
struct Recorded {
    bodies: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<Recorded>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn list_hours(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    (
        StatusCode::OK,
        Json(json!({"data": [
            {"id": "oh-mon", "day": "Mon", "start_time": "09:00", "end_time": "17:00",
             "is_enabled": true},
            {"id": "oh-sun", "day": "Sun", "start_time": "10:00:00", "end_time": "14:00:00",
             "is_enabled": false}
        ]})),
    )
}

async fn update_hours(
    State(recorded): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    recorded.lock().await.bodies.push((id, body));
    StatusCode::NO_CONTENT
}

async fn list_slot_types() -> Json<Value> {
    Json(json!({"data": [
        {"id": "st-1", "label": "Weekoff", "start_time": "09:00", "end_time": "13:00",
         "price": "0.00", "allow_booking": false, "days": ["Sun", "Sat"]}
    ]}))
}

async fn create_slot_type(State(recorded): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    recorded.lock().await.bodies.push(("new".to_string(), body.clone()));
    let mut created = body;
    created["id"] = json!("st-created");
    Json(json!({ "data": created }))
}

async fn delete_slot_type(Path(id): Path<String>) -> (StatusCode, String) {
    if id == "st-missing" {
        (StatusCode::NOT_FOUND, "slot type not found".to_string())
    } else {
        (StatusCode::NO_CONTENT, String::new())
    }
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn clinic_service() -> (HttpGateway, Shared) {
    let recorded = Shared::default();
    let router = Router::new()
        .route("/clinic/operating-hours", get(list_hours))
        .route("/clinic/operating-hours/:id", put(update_hours))
        .route("/clinic/slot-types", get(list_slot_types).post(create_slot_type))
        .route("/clinic/slot-types/:id", axum::routing::delete(delete_slot_type))
        .with_state(recorded.clone());
    let base_url = spawn_server(router).await;
    let gateway = HttpGateway::new(GatewayConfig::new(base_url, TOKEN)).unwrap();
    (gateway, recorded)
}

#[tokio::test]
async fn test_list_operating_hours_sends_bearer_and_unwraps_envelope() {
    let (gateway, _) = clinic_service().await;

    let entries = gateway
        .list_operating_hours(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, EntryId("oh-mon".to_string()));
    assert_eq!(entries[1].day, Weekday::Sun);
    assert_eq!(entries[1].window.start.to_string(), "10:00");
    assert!(!entries[1].enabled);
}

#[tokio::test]
async fn test_unauthorized_response_is_sync_error() {
    let router = Router::new().route("/clinic/operating-hours", get(list_hours));
    let base_url = spawn_server(router).await;
    let gateway = HttpGateway::new(GatewayConfig::new(base_url, "wrong-token")).unwrap();

    let err = gateway
        .list_operating_hours(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScheduleError::Sync(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_update_operating_hours_sends_encoded_window() {
    let (gateway, recorded) = clinic_service().await;
    let update = OperatingHoursUpdate {
        window: TimeWindow {
            start: "08:30".parse().unwrap(),
            end: "13:00".parse().unwrap(),
        },
        is_enabled: true,
    };

    let cancel = CancellationToken::new();
    gateway
        .update_operating_hours(&EntryId("oh-mon".to_string()), &update, &cancel)
        .await
        .unwrap();

    let recorded = recorded.lock().await;
    assert_eq!(
        recorded.bodies,
        vec![(
            "oh-mon".to_string(),
            json!({"start_time": "08:30", "end_time": "13:00", "is_enabled": true})
        )]
    );
}

#[tokio::test]
async fn test_ids_are_escaped_as_one_path_segment() {
    let (gateway, recorded) = clinic_service().await;
    let cancel = CancellationToken::new();
    let update = OperatingHoursUpdate {
        window: TimeWindow {
            start: "09:00".parse().unwrap(),
            end: "12:00".parse().unwrap(),
        },
        is_enabled: false,
    };

    gateway
        .update_operating_hours(&EntryId("oh/mon #1?x".to_string()), &update, &cancel)
        .await
        .unwrap();
    gateway
        .delete_slot_type(&SlotTypeId("st/../1".to_string()), &cancel)
        .await
        .unwrap();

    assert_eq!(recorded.lock().await.bodies[0].0, "oh/mon #1?x");
}

#[tokio::test]
async fn test_inverted_window_from_service_is_sync_error() {
    let router = Router::new().route(
        "/clinic/operating-hours",
        get(|| async {
            Json(json!({"data": [
                {"id": "oh-mon", "day": "Mon", "start_time": "17:00", "end_time": "09:00",
                 "is_enabled": true}
            ]}))
        }),
    );
    let base_url = spawn_server(router).await;
    let gateway = HttpGateway::new(GatewayConfig::new(base_url, TOKEN)).unwrap();

    let err = gateway
        .list_operating_hours(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Sync(_)), "{:?}", err);
}

#[tokio::test]
async fn test_slot_types_round_trip_through_service() {
    let (gateway, recorded) = clinic_service().await;
    let cancel = CancellationToken::new();

    let listed = gateway.list_slot_types(&cancel).await.unwrap();
    assert_eq!(listed[0].category, SlotCategory::RecurringDayOff);
    assert_eq!(listed[0].days.to_list(), vec![Weekday::Sat, Weekday::Sun]);

    let fields = SlotTypeFields {
        label: "Evening Consultation".to_string(),
        category: SlotCategory::Regular,
        window: TimeWindow {
            start: "18:00".parse().unwrap(),
            end: "20:00".parse().unwrap(),
        },
        price: "250.00".parse().unwrap(),
        allow_booking: true,
        days: Default::default(),
    };
    let created = gateway.create_slot_type(&fields, &cancel).await.unwrap();

    assert_eq!(created.id, SlotTypeId("st-created".to_string()));
    assert_eq!(created.fields(), fields);
    assert_eq!(recorded.lock().await.bodies[0].1["price"], json!("250.00"));
}

#[tokio::test]
async fn test_delete_not_found_is_sync_error() {
    let (gateway, _) = clinic_service().await;
    let cancel = CancellationToken::new();

    gateway
        .delete_slot_type(&SlotTypeId("st-1".to_string()), &cancel)
        .await
        .unwrap();

    let err = gateway
        .delete_slot_type(&SlotTypeId("st-missing".to_string()), &cancel)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("slot type not found"));
}

#[tokio::test]
async fn test_malformed_response_is_sync_error() {
    let router = Router::new().route(
        "/clinic/slot-types",
        get(|| async { Json(json!({"data": [{"id": 7}]})) }),
    );
    let base_url = spawn_server(router).await;
    let gateway = HttpGateway::new(GatewayConfig::new(base_url, TOKEN)).unwrap();

    let err = gateway
        .list_slot_types(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Sync(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/clinic/operating-hours",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"data": []}))
        }),
    );
    let base_url = spawn_server(router).await;
    let config =
        GatewayConfig::new(base_url, TOKEN).with_request_timeout(Duration::from_millis(100));
    let gateway = HttpGateway::new(config).unwrap();

    let err = gateway
        .list_operating_hours(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Timeout(timeout) if timeout == Duration::from_millis(100)
    ));
}

#[test_log::test(tokio::test)]
async fn test_cancelled_request_returns_cancelled() {
    let router = Router::new().route(
        "/clinic/slot-types",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"data": []}))
        }),
    );
    let base_url = spawn_server(router).await;
    let gateway = HttpGateway::new(GatewayConfig::new(base_url, TOKEN)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = gateway.list_slot_types(&cancel).await.unwrap_err();
    assert!(matches!(err, ScheduleError::Cancelled));
}
