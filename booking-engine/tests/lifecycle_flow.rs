//! Create / modify / cancel against the in-memory store

mod common;

use booking_engine::testing::GatewayCall;
use booking_engine::{
    BookingError, DepositOutcome, IntentStatus, NotificationKind, ReservationStore,
};
use common::{booking, day, harness, link_of};
use shared::models::{Reservation, ReservationStatus, TableType};
use shared::request::{HoldRequest, ModifyReservationRequest};

fn two_tops() -> Vec<TableType> {
    vec![TableType::new(2, 2), TableType::new(4, 1)]
}

fn hold_request(h: &common::Harness) -> HoldRequest {
    HoldRequest {
        restaurant_id: h.restaurant_id,
        customer_email: "ann@example.com".into(),
    }
}

#[tokio::test]
async fn test_late_cancellation_captures_deposit() {
    let h = harness(true, two_tops());

    // Hold placed from the booking page before submitting
    let hold = h.service.place_deposit_hold(&hold_request(&h)).await.unwrap();
    assert_eq!(hold.status, IntentStatus::RequiresCapture);

    // 48h out: 2026-05-03 08:00 New York
    let mut req = booking(&h, day(2026, 5, 3), "08:00");
    req.payment_intent_id = Some(hold.intent_id.clone());
    let created = h.service.create(req).await.unwrap();
    assert_eq!(created.warning, None);
    assert_eq!(
        created.reservation.deposit_payment_intent_id.as_deref(),
        Some(hold.intent_id.as_str())
    );
    let (code, mac) = link_of(&created);

    // Moved to 12h out: 2026-05-01 20:00 New York
    let modified = h
        .service
        .modify(
            &code,
            &mac,
            ModifyReservationRequest {
                date: day(2026, 5, 1),
                time_slot_start: "8:00 PM".into(),
                party_size: 2,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(modified.reservation.timeslot_start, "20:00");
    assert_eq!(modified.reservation.timeslot_end, "21:00");

    let cancelled = h.service.cancel(&code, &mac).await.unwrap();
    assert_eq!(cancelled.reservation.status, ReservationStatus::Cancelled);
    assert_eq!(
        cancelled.deposit,
        DepositOutcome::Captured {
            intent_id: hold.intent_id.clone()
        }
    );

    let calls = h.gateway.calls();
    let authorizations: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, GatewayCall::Authorize { .. }))
        .collect();
    assert_eq!(
        authorizations,
        vec![&GatewayCall::Authorize {
            amount_minor: 2000,
            currency: "USD".into()
        }]
    );
    assert_eq!(
        h.gateway.count(|c| matches!(c, GatewayCall::Capture(_))),
        1
    );
    assert!(calls.contains(&GatewayCall::Capture(hold.intent_id.clone())));
    assert_eq!(h.gateway.status_of(&hold.intent_id), Some(IntentStatus::Succeeded));

    let stored = h.store.reservations();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, ReservationStatus::Cancelled);

    assert_eq!(h.notifier.count(NotificationKind::Created), 1);
    assert_eq!(h.notifier.count(NotificationKind::Modified), 1);
    assert_eq!(h.notifier.count(NotificationKind::Cancelled), 1);
}

#[tokio::test]
async fn test_early_cancellation_releases_deposit() {
    let h = harness(true, two_tops());
    let hold = h.service.place_deposit_hold(&hold_request(&h)).await.unwrap();

    let mut req = booking(&h, day(2026, 5, 3), "08:00");
    req.payment_intent_id = Some(hold.intent_id.clone());
    let created = h.service.create(req).await.unwrap();
    let (code, mac) = link_of(&created);

    let cancelled = h.service.cancel(&code, &mac).await.unwrap();
    assert_eq!(
        cancelled.deposit,
        DepositOutcome::Released {
            intent_id: hold.intent_id.clone()
        }
    );
    assert_eq!(h.gateway.count(|c| matches!(c, GatewayCall::Capture(_))), 0);
    assert_eq!(h.gateway.count(|c| matches!(c, GatewayCall::Void(_))), 1);

    // The cancellation email points at the booking page, not the dead link
    let sent = h.notifier.sent();
    let notice = sent
        .iter()
        .find(|n| n.kind == NotificationKind::Cancelled)
        .unwrap();
    assert_eq!(
        notice.params.link.as_deref(),
        Some("https://book.example.com/harbor-grill")
    );
}

#[tokio::test]
async fn test_capture_failure_keeps_reservation_open() {
    let h = harness(true, two_tops());
    let hold = h.service.place_deposit_hold(&hold_request(&h)).await.unwrap();

    // 10h out, inside the 24h window
    let mut req = booking(&h, day(2026, 5, 1), "18:00");
    req.payment_intent_id = Some(hold.intent_id);
    let created = h.service.create(req).await.unwrap();
    let (code, mac) = link_of(&created);

    h.gateway
        .fail_capture(booking_engine::GatewayError::Declined("insufficient_funds".into()));
    let err = h.service.cancel(&code, &mac).await.unwrap_err();
    assert!(matches!(err, BookingError::Payment(_)));
    assert_eq!(h.store.reservations()[0].status, ReservationStatus::New);
    assert_eq!(h.notifier.count(NotificationKind::Cancelled), 0);
}

#[tokio::test]
async fn test_modify_resets_status_and_keeps_code() {
    let h = harness(false, two_tops());
    let created = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let (code, mac) = link_of(&created);

    // Front of house marks the table seated and the week reminder sent
    let seated = Reservation {
        status: ReservationStatus::Seated,
        reminder_1_week_sent: true,
        ..created.reservation.clone()
    };
    h.store
        .update_reservation(&seated, created.reservation.updated_at, None)
        .await
        .unwrap();

    let modified = h
        .service
        .modify(
            &code,
            &mac,
            ModifyReservationRequest {
                date: day(2026, 5, 12),
                time_slot_start: "12:00".into(),
                party_size: 4,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap();

    let r = &modified.reservation;
    assert_eq!(r.status, ReservationStatus::New);
    assert_eq!(r.confirmation_code, created.reservation.confirmation_code);
    assert_eq!(r.id, created.reservation.id);
    assert_eq!(r.party_size, 4);
    assert!(!r.reminder_1_week_sent);
    assert!(r.reminder_1_day_at > created.reservation.reminder_1_day_at);
    assert_eq!(modified.management_path, created.management_path);
}

#[tokio::test]
async fn test_modify_is_locked_inside_cancellation_window() {
    let h = harness(false, two_tops());
    let created = h
        .service
        .create(booking(&h, day(2026, 5, 1), "20:00"))
        .await
        .unwrap();
    let (code, mac) = link_of(&created);

    let err = h
        .service
        .modify(
            &code,
            &mac,
            ModifyReservationRequest {
                date: day(2026, 5, 5),
                time_slot_start: "19:00".into(),
                party_size: 2,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ModificationLocked));

    // Cancellation is always allowed
    let cancelled = h.service.cancel(&code, &mac).await.unwrap();
    assert_eq!(cancelled.deposit, DepositOutcome::NoDeposit);
}

#[tokio::test]
async fn test_terminal_reservation_cannot_change() {
    let h = harness(false, two_tops());
    let created = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let (code, mac) = link_of(&created);

    h.service.cancel(&code, &mac).await.unwrap();
    let again = h.service.cancel(&code, &mac).await.unwrap_err();
    assert!(matches!(
        again,
        BookingError::Terminal(ReservationStatus::Cancelled)
    ));

    let modify = h
        .service
        .modify(
            &code,
            &mac,
            ModifyReservationRequest {
                date: day(2026, 5, 11),
                time_slot_start: "19:00".into(),
                party_size: 2,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(modify, BookingError::Terminal(_)));
}

#[tokio::test]
async fn test_deposit_policy_is_enforced() {
    let h = harness(true, two_tops());

    let missing = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap_err();
    assert!(matches!(missing, BookingError::DepositRequired));

    let hold = h.gateway.place_hold();
    h.gateway.set_status(&hold, IntentStatus::Canceled);
    let mut req = booking(&h, day(2026, 5, 10), "19:00");
    req.payment_intent_id = Some(hold);
    let inactive = h.service.create(req).await.unwrap_err();
    assert!(matches!(inactive, BookingError::HoldInactive));

    assert!(h.store.reservations().is_empty());
}

#[tokio::test]
async fn test_replacing_hold_releases_the_old_one() {
    let h = harness(true, two_tops());
    let first = h.gateway.place_hold();
    let mut req = booking(&h, day(2026, 5, 10), "19:00");
    req.payment_intent_id = Some(first.clone());
    let created = h.service.create(req).await.unwrap();
    let (code, mac) = link_of(&created);

    let second = h.gateway.place_hold();
    let modified = h
        .service
        .modify(
            &code,
            &mac,
            ModifyReservationRequest {
                date: day(2026, 5, 10),
                time_slot_start: "20:00".into(),
                party_size: 4,
                payment_intent_id: Some(second.clone()),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        modified.reservation.deposit_payment_intent_id.as_deref(),
        Some(second.as_str())
    );
    assert_eq!(h.gateway.status_of(&first), Some(IntentStatus::Canceled));
    assert_eq!(h.gateway.status_of(&second), Some(IntentStatus::RequiresCapture));
}

#[tokio::test]
async fn test_notification_failure_is_a_warning() {
    let h = harness(false, two_tops());
    h.notifier.set_failing(true);

    let receipt = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    assert!(receipt.warning.is_some());
    assert_eq!(h.store.reservations().len(), 1);

    let (code, mac) = link_of(&receipt);
    let cancelled = h.service.cancel(&code, &mac).await.unwrap();
    assert!(cancelled.warning.is_some());
    assert_eq!(
        h.store.reservations()[0].status,
        ReservationStatus::Cancelled
    );
}

#[tokio::test]
async fn test_management_link_survives_only_with_same_email() {
    let h = harness(false, two_tops());
    let receipt = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let (code, mac) = link_of(&receipt);

    assert!(h.service.access(&code, &mac).await.is_ok());

    let changed = Reservation {
        customer_email: "ann.lee@example.com".into(),
        ..receipt.reservation.clone()
    };
    h.store
        .update_reservation(&changed, receipt.reservation.updated_at, None)
        .await
        .unwrap();
    assert!(matches!(
        h.service.access(&code, &mac).await,
        Err(BookingError::Security)
    ));
}

#[tokio::test]
async fn test_customer_history_is_merged() {
    let h = harness(false, two_tops());
    h.service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let mut again = booking(&h, day(2026, 5, 11), "19:00");
    again.customer_name = "Annie Lee".into();
    h.service.create(again).await.unwrap();

    let customer = h.store.customer("ann@example.com").unwrap();
    assert_eq!(customer.names, vec!["Ann Lee", "Annie Lee"]);
    assert_eq!(customer.phones, vec!["+12125550100"]);

    let stored = h.store.reservations();
    assert!(stored.iter().all(|r| r.customer_id == customer.id));
}

#[tokio::test]
async fn test_completed_reservation_still_blocks_its_table() {
    let h = harness(false, vec![TableType::new(2, 1)]);
    let created = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap();
    let completed = Reservation {
        status: ReservationStatus::Completed,
        ..created.reservation.clone()
    };
    h.store
        .update_reservation(&completed, created.reservation.updated_at, None)
        .await
        .unwrap();

    let err = h
        .service
        .create(booking(&h, day(2026, 5, 10), "19:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable(_)));

    let history = h
        .service
        .list_all(h.restaurant_id, day(2026, 5, 10), day(2026, 5, 10))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
