//! Concurrent creates for the last table must not double-book it

mod common;

use booking_engine::BookingError;
use common::{booking, day, harness};
use shared::models::TableType;
use shared::request::AvailabilityQuery;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_claim_last_table_once() {
    let h = harness(false, vec![TableType::new(2, 1)]);

    let mut tasks = Vec::new();
    for n in 0..8 {
        let service = h.service.clone();
        let mut req = booking(&h, day(2026, 5, 10), "19:00");
        req.customer_email = format!("guest{n}@example.com");
        tasks.push(tokio::spawn(async move { service.create(req).await }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(BookingError::SlotUnavailable(slot)) => {
                assert!(slot.is_empty() || slot == "19:00");
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
    assert_eq!(h.store.reservations().len(), 1);
}

#[tokio::test]
async fn test_neighbouring_slots_stay_open() {
    let h = harness(false, vec![TableType::new(2, 1)]);
    h.service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();

    let availability = h
        .service
        .available_slots(
            h.restaurant_id,
            &AvailabilityQuery {
                date: day(2026, 5, 10),
                party_size: 2,
            },
        )
        .await
        .unwrap();
    let state = |start: &str| {
        availability
            .slots
            .iter()
            .find(|s| s.start == start)
            .map(|s| s.available)
    };
    assert_eq!(state("18:00"), Some(true));
    assert_eq!(state("19:00"), Some(false));
    assert_eq!(state("20:00"), Some(true));
    assert_eq!(availability.timezone, "America/New_York");
}

#[tokio::test]
async fn test_moving_within_own_slot_is_not_blocked_by_itself() {
    let h = harness(false, vec![TableType::new(2, 1)]);
    let created = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let (code, mac) = common::link_of(&created);

    let modified = h
        .service
        .modify(
            &code,
            &mac,
            shared::request::ModifyReservationRequest {
                date: day(2026, 5, 10),
                time_slot_start: "19:00".into(),
                party_size: 1,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(modified.reservation.party_size, 1);
}
