//! API routes for booking-cloud

pub mod availability;
pub mod cron;
pub mod health;
pub mod payments;
pub mod reservations;

use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use http::HeaderName;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Routes only, no middleware
fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/restaurants/{id}/availability",
            get(availability::get_availability),
        )
        .route("/api/reservations", post(reservations::create))
        .route(
            "/api/reservations/{code}/{mac}",
            get(reservations::get).put(reservations::modify),
        )
        .route(
            "/api/reservations/{code}/{mac}/cancel",
            post(reservations::cancel),
        )
        .route("/api/payments/holds", post(payments::create_hold))
        .route("/api/cron/reminders", get(cron::send_reminders))
}

/// Fully layered application
pub fn router(state: AppState) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use booking_engine::testing::{RecordingGateway, RecordingNotifier};
    use booking_engine::{EngineConfig, FixedClock, MemoryStore, ReservationService};
    use chrono::{TimeZone, Utc};
    use http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use shared::models::{ReservationSetting, Restaurant, TableType, TimeRange};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    const CRON_SECRET: &str = "cron-test-secret";

    fn app() -> (Router, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let restaurant_id = Uuid::new_v4();
        store.add_restaurant(Restaurant {
            id: restaurant_id,
            name: "Harbor Grill".into(),
            address: "12 Pier Rd".into(),
            thumbnail_url: None,
            timezone: "America/New_York".into(),
            min_advance_hours: 2,
            max_advance_hours: 24 * 60,
            allowed_cancellation_hours: 24,
            deposit_required: false,
            deposit_amount: Decimal::ZERO,
            deposit_currency: "USD".into(),
            booking_page_url: None,
        });
        for weekday in 0..7 {
            store.add_setting(ReservationSetting {
                id: Uuid::new_v4(),
                restaurant_id,
                day_of_week: Some(weekday),
                specific_date: None,
                timeslot_length_minutes: 60,
                time_ranges: vec![TimeRange::new("08:00", "22:00")],
                table_inventory: vec![TableType::new(2, 2), TableType::new(4, 1)],
            });
        }

        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        ));
        let config = EngineConfig {
            verify_backoff: Duration::ZERO,
            public_base_url: "https://book.example.com".into(),
            ..EngineConfig::default()
        };
        let service = ReservationService::new(
            store,
            Arc::new(RecordingGateway::new()),
            Arc::new(RecordingNotifier::new()),
            clock,
            "api-test-secret",
            config,
        )
        .unwrap();
        (
            router(AppState::new(service, CRON_SECRET.to_string())),
            restaurant_id,
        )
    }

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn booking_body(restaurant_id: Uuid) -> Value {
        json!({
            "restaurant_id": restaurant_id,
            "date": "2026-05-03",
            "time_slot_start": "19:00",
            "party_size": 2,
            "customer_name": "Ann Lee",
            "customer_email": "ann@example.com",
            "customer_phone": "+12125550100",
            "special_occasion": "birthday"
        })
    }

    /// `/reservations/{code}/{mac}` → `/api/reservations/{code}/{mac}`
    fn api_path(receipt: &Value) -> String {
        format!(
            "/api{}",
            receipt["data"]["management_path"].as_str().unwrap()
        )
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = call(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_availability_lists_open_slots() {
        let (app, id) = app();
        let (status, body) = call(
            &app,
            get(&format!(
                "/api/restaurants/{id}/availability?date=2026-05-03&party_size=2"
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0);
        let slots = body["data"]["slots"].as_array().unwrap();
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| s["available"] == true));
    }

    #[tokio::test]
    async fn test_availability_unknown_restaurant_is_404() {
        let (app, _) = app();
        let (status, _) = call(
            &app,
            get(&format!(
                "/api/restaurants/{}/availability?date=2026-05-03&party_size=2",
                Uuid::new_v4()
            )),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_then_manage_through_link() {
        let (app, id) = app();
        let (status, created) =
            call(&app, send_json("POST", "/api/reservations", booking_body(id))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["reservation"]["status"], "new");
        let path = api_path(&created);

        let (status, fetched) = call(&app, get(&path)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["timeslot_start"], "19:00");

        let (status, modified) = call(
            &app,
            send_json(
                "PUT",
                &path,
                json!({"date": "2026-05-03", "time_slot_start": "20:00", "party_size": 3}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(modified["data"]["reservation"]["party_size"], 3);

        let (status, cancelled) =
            call(&app, send_json("POST", &format!("{path}/cancel"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["data"]["reservation"]["status"], "cancelled");
        assert_eq!(cancelled["data"]["deposit"]["outcome"], "no_deposit");

        let (status, _) =
            call(&app, send_json("POST", &format!("{path}/cancel"), json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_tampered_link_is_not_found() {
        let (app, id) = app();
        let (_, created) =
            call(&app, send_json("POST", "/api/reservations", booking_body(id))).await;
        let code = created["data"]["reservation"]["confirmation_code"]
            .as_str()
            .unwrap();

        let (status, body) = call(&app, get(&format!("/api/reservations/{code}/deadbeef"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_booking_reports_fields() {
        let (app, id) = app();
        let mut body = booking_body(id);
        body["customer_email"] = json!("not-an-email");
        body["party_size"] = json!(0);

        let (status, resp) = call(&app, send_json("POST", "/api/reservations", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp["details"]["customer_email"].is_array());
        assert!(resp["details"]["party_size"].is_array());
    }

    #[tokio::test]
    async fn test_hold_rejected_without_deposit_policy() {
        let (app, id) = app();
        let (status, _) = call(
            &app,
            send_json(
                "POST",
                "/api/payments/holds",
                json!({"restaurant_id": id, "customer_email": "ann@example.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cron_requires_bearer_token() {
        let (app, _) = app();
        let (status, _) = call(&app, get("/api/cron/reminders?type=1_day")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/api/cron/reminders?type=1_day")
            .header("authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(&app, wrong).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cron_runs_sweep() {
        let (app, _) = app();
        let authed = |uri: &str| {
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {CRON_SECRET}"))
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = call(&app, authed("/api/cron/reminders?type=1_day")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kind"], "1_day");
        assert_eq!(body["data"]["sent"], 0);

        let (status, _) = call(&app, authed("/api/cron/reminders?type=2_hours")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let (app, _) = app();
        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        assert!(resp.headers().contains_key("x-request-id"));
    }
}
