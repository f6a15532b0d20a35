//! Reminder sweep: due selection, the "safely in the future" guard and
//! claim-before-send idempotence

mod common;

use booking_engine::{BookingError, NotificationKind};
use chrono::{TimeZone, Utc};
use common::{booking, day, harness, link_of};
use shared::models::TableType;

fn tables() -> Vec<TableType> {
    vec![TableType::new(2, 4)]
}

#[tokio::test]
async fn test_week_reminder_is_sent_once() {
    let h = harness(false, tables());
    // 2026-05-11 19:00 New York, reminder due 2026-05-04 19:00 (23:00Z)
    let receipt = h
        .service
        .create(booking(&h, day(2026, 5, 11), "19:00"))
        .await
        .unwrap();
    assert_eq!(
        receipt.reservation.reminder_1_week_at,
        Utc.with_ymd_and_hms(2026, 5, 4, 23, 0, 0).unwrap()
    );

    let early = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!(early.sent, 0);

    h.clock.set(Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap());
    let first = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!((first.matched, first.sent, first.failed), (1, 1, 0));

    let second = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!(second.sent, 0);
    assert_eq!(h.notifier.count(NotificationKind::Reminder1Week), 1);

    let sent = h.notifier.sent();
    let reminder = sent
        .iter()
        .find(|n| n.kind == NotificationKind::Reminder1Week)
        .unwrap();
    assert_eq!(reminder.recipient, "ann@example.com");
    assert_eq!(reminder.params.time, "7:00 PM");
    assert_eq!(reminder.params.link.as_deref(), Some(receipt.management_url.as_str()));

    // Day reminder is not due yet
    let day_sweep = h.service.send_reminders("1_day").await.unwrap();
    assert_eq!(day_sweep.sent, 0);
    assert!(h.store.reservations()[0].reminder_1_week_sent);
}

#[tokio::test]
async fn test_short_notice_booking_skips_week_reminder() {
    let h = harness(false, tables());
    // Booked two days out: the week reminder is already in the past
    h.service
        .create(booking(&h, day(2026, 5, 3), "19:00"))
        .await
        .unwrap();

    let week = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!((week.matched, week.sent), (0, 0));
    assert!(!h.store.reservations()[0].reminder_1_week_sent);

    // 2026-05-03 00:00Z: day reminder (due 05-02 23:00Z) fires
    h.clock.set(Utc.with_ymd_and_hms(2026, 5, 3, 0, 0, 0).unwrap());
    let day_sweep = h.service.send_reminders("1_day").await.unwrap();
    assert_eq!(day_sweep.sent, 1);
    assert_eq!(h.notifier.count(NotificationKind::Reminder1Day), 1);
}

#[tokio::test]
async fn test_cancelled_reservations_get_no_reminder() {
    let h = harness(false, tables());
    let receipt = h
        .service
        .create(booking(&h, day(2026, 5, 11), "19:00"))
        .await
        .unwrap();
    let (code, mac) = link_of(&receipt);
    h.service.cancel(&code, &mac).await.unwrap();

    h.clock.set(Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap());
    let report = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!(report.matched, 0);
    assert_eq!(h.notifier.count(NotificationKind::Reminder1Week), 0);
}

#[tokio::test]
async fn test_failed_delivery_is_not_retried() {
    let h = harness(false, tables());
    h.service
        .create(booking(&h, day(2026, 5, 11), "19:00"))
        .await
        .unwrap();

    h.clock.set(Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap());
    h.notifier.set_failing(true);
    let failed = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!((failed.matched, failed.sent, failed.failed), (1, 0, 1));

    h.notifier.set_failing(false);
    let rerun = h.service.send_reminders("1_week").await.unwrap();
    assert_eq!(rerun.sent, 0);
}

#[tokio::test]
async fn test_unknown_kind_is_rejected() {
    let h = harness(false, tables());
    let err = h.service.send_reminders("weekly").await.unwrap_err();
    assert!(matches!(err, BookingError::ReminderKind(_)));
}
