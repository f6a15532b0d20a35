//! Shared harness: a New York restaurant open 08:00-22:00 every day,
//! hourly slots, 24h cancellation window, wired to the in-memory store,
//! recording gateway/notifier and a fixed clock.

#![allow(dead_code)]

use booking_engine::testing::{RecordingGateway, RecordingNotifier};
use booking_engine::{
    BookingReceipt, EngineConfig, FixedClock, MemoryStore, ReservationService, ReservationStore,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::models::{ReservationSetting, Restaurant, TableType, TimeRange};
use shared::request::CreateReservationRequest;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

pub struct Harness {
    pub service: Arc<ReservationService>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<RecordingGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub restaurant_id: Uuid,
}

/// 2026-05-01 08:00 in New York
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn harness(deposit_required: bool, tables: Vec<TableType>) -> Harness {
    harness_with_store(deposit_required, tables, |store| store)
}

/// Same restaurant, but the service writes through `wrap(store)`
pub fn harness_with_store(
    deposit_required: bool,
    tables: Vec<TableType>,
    wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn ReservationStore>,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let restaurant_id = Uuid::new_v4();
    store.add_restaurant(Restaurant {
        id: restaurant_id,
        name: "Harbor Grill".into(),
        address: "12 Pier Rd, New York".into(),
        thumbnail_url: None,
        timezone: "America/New_York".into(),
        min_advance_hours: 2,
        max_advance_hours: 24 * 60,
        allowed_cancellation_hours: 24,
        deposit_required,
        deposit_amount: Decimal::new(20, 0),
        deposit_currency: "USD".into(),
        booking_page_url: Some("https://book.example.com/harbor-grill".into()),
    });
    for weekday in 0..7 {
        store.add_setting(ReservationSetting {
            id: Uuid::new_v4(),
            restaurant_id,
            day_of_week: Some(weekday),
            specific_date: None,
            timeslot_length_minutes: 60,
            time_ranges: vec![TimeRange::new("08:00", "22:00")],
            table_inventory: tables.clone(),
        });
    }

    let gateway = Arc::new(RecordingGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let config = EngineConfig {
        verify_backoff: Duration::ZERO,
        public_base_url: "https://book.example.com".into(),
        ..EngineConfig::default()
    };
    let service = ReservationService::new(
        wrap(store.clone()),
        gateway.clone(),
        notifier.clone(),
        clock.clone(),
        SECRET,
        config,
    )
    .unwrap();

    Harness {
        service: Arc::new(service),
        store,
        gateway,
        notifier,
        clock,
        restaurant_id,
    }
}

pub fn booking(h: &Harness, date: NaiveDate, start: &str) -> CreateReservationRequest {
    CreateReservationRequest {
        restaurant_id: h.restaurant_id,
        date,
        time_slot_start: start.into(),
        party_size: 2,
        customer_name: "Ann Lee".into(),
        customer_email: "ann@example.com".into(),
        customer_phone: "+12125550100".into(),
        dietary_restrictions: None,
        other_dietary_restrictions: None,
        special_occasion: Some("birthday".into()),
        other_special_occasion: None,
        special_requests: Some("Window seat".into()),
        payment_intent_id: None,
    }
}

/// `(code, mac)` from a receipt's management path
pub fn link_of(receipt: &BookingReceipt) -> (String, String) {
    let mut parts = receipt.management_path.rsplit('/');
    let mac = parts.next().unwrap().to_string();
    let code = parts.next().unwrap().to_string();
    (code, mac)
}
