//! Router-level tests.
//!
//! Requests go through `tower::ServiceExt::oneshot` against an in-memory
//! event store. The PostgreSQL pool is created lazily and never touched by
//! these paths.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use backoffice_server::clock::FixedClock;
use backoffice_server::config::Config;
use backoffice_server::models::NewEvent;
use backoffice_server::routes::create_routes;
use backoffice_server::state::AppState;
use backoffice_server::store::{EventStore, MemoryEventStore};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap()
}

fn test_config() -> Config {
    Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://localhost/backoffice_test".to_string()),
        _ => None,
    })
    .unwrap()
}

struct TestApp {
    router: Router,
    store: Arc<MemoryEventStore>,
    clock: Arc<FixedClock>,
}

async fn test_app() -> TestApp {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    let store = Arc::new(MemoryEventStore::new());
    let clock = Arc::new(FixedClock::new(now()));
    let state = AppState::new(pool, store.clone(), clock.clone());

    TestApp {
        router: create_routes(state, &config),
        store,
        clock,
    }
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_event(router: &Router, body: Value) -> (StatusCode, Value) {
    send(router, "POST", "/api/events", Some(body)).await
}

fn event_body(name: &str, start_hours: i64, end_hours: i64) -> Value {
    json!({
        "name": name,
        "start_time": (now() + Duration::hours(start_hours)).to_rfc3339(),
        "end_time": (now() + Duration::hours(end_hours)).to_rfc3339(),
    })
}

#[tokio::test]
async fn test_health_check_sets_security_headers() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert!(headers.get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_create_running_event_becomes_active() {
    let app = test_app().await;

    let (status, body) = create_event(&app.router, event_body("New Year", -1, 3)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["is_active"], true);

    let (status, body) = send(&app.router, "GET", "/api/events/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "New Year");
}

#[tokio::test]
async fn test_create_rejects_inverted_window() {
    let app = test_app().await;

    let (status, body) = create_event(&app.router, event_body("Backwards", 2, 1)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(app.store.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_reconciles_and_classifies() {
    let app = test_app().await;
    app.store
        .insert_event(NewEvent {
            name: "Last night".to_string(),
            start_time: now() - Duration::hours(26),
            end_time: now() - Duration::hours(20),
            is_active: true,
        })
        .await
        .unwrap();
    app.store
        .insert_event(NewEvent {
            name: "Tonight".to_string(),
            start_time: now() - Duration::hours(1),
            end_time: now() + Duration::hours(4),
            is_active: false,
        })
        .await
        .unwrap();
    app.store
        .insert_event(NewEvent {
            name: "Tomorrow".to_string(),
            start_time: now() + Duration::hours(20),
            end_time: now() + Duration::hours(24),
            is_active: false,
        })
        .await
        .unwrap();

    let (status, body) = send(&app.router, "GET", "/api/events", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["current"][0]["name"], "Tonight");
    assert_eq!(data["future"][0]["name"], "Tomorrow");
    assert_eq!(data["past"][0]["name"], "Last night");
    assert_eq!(data["events"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_end_and_cancel_event() {
    let app = test_app().await;
    let (_, body) = create_event(&app.router, event_body("Dinner", -2, 2)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    app.clock.advance(Duration::minutes(45));
    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/events/{}/end", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
    let ended_at: DateTime<Utc> = body["data"]["end_time"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(ended_at, now() + Duration::minutes(45));

    let (status, _) = send(&app.router, "DELETE", &format!("/api/events/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, "DELETE", &format!("/api/events/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_moves_active_flag() {
    let app = test_app().await;
    let (_, first) = create_event(&app.router, event_body("First", -1, 1)).await;
    let (_, second) = create_event(&app.router, event_body("Second", 5, 6)).await;
    let first_id: Uuid = first["data"]["id"].as_str().unwrap().parse().unwrap();
    let second_id = second["data"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        "PUT",
        &format!("/api/events/{}", second_id),
        Some(event_body("Second", -1, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);
    assert!(!app.store.get_event(first_id).await.unwrap().is_active);
}

#[tokio::test]
async fn test_manual_reconcile_reports_changes() {
    let app = test_app().await;
    let (_, body) = create_event(&app.router, event_body("Later", 1, 2)).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app.router, "POST", "/api/events/reconcile", None).await;
    assert!(body["data"]["activated"].is_null());

    app.clock.advance(Duration::minutes(90));
    let (status, body) = send(&app.router, "POST", "/api/events/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["activated"], id.as_str());
}

#[tokio::test]
async fn test_pending_orders_without_active_event() {
    let app = test_app().await;
    let (status, body) = send(&app.router, "GET", "/api/orders/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["event"].is_null());
    assert_eq!(body["data"]["orders"], json!([]));
    assert_eq!(body["message"], "No active event");
}

#[tokio::test]
async fn test_product_validation_happens_before_storage() {
    let app = test_app().await;
    let (status, body) = send(
        &app.router,
        "POST",
        "/api/products",
        Some(json!({ "name": "Cava", "stock": -3, "price": "6.50", "discounted_price": "5.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_history_for_unknown_event_is_not_found() {
    let app = test_app().await;
    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/events/{}/history", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = test_app().await;
    let (status, body) = create_event(
        &app.router,
        json!({
            "name": "Broken clock",
            "start_time": "not-a-date",
            "end_time": now().to_rfc3339(),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("start_time"));
    assert!(app.store.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_id_uses_error_envelope() {
    let app = test_app().await;
    let (status, body) = send(&app.router, "POST", "/api/events/not-a-uuid/end", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app.router, "POST", "/api/orders/42/accept", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
