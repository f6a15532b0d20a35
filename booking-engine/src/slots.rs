//! Slot generation
//!
//! Expands a day's configured time ranges into fixed-length slots and marks
//! each one available or not by replaying the overlapping reservations onto
//! a fresh copy of the table inventory.

use crate::capacity::{self, CapacityError, Inventory};
use crate::time::{self, TimeError};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use shared::models::{Reservation, TableType, TimeRange, TimeSlot};
use std::collections::HashSet;
use uuid::Uuid;

/// An existing reservation as an absolute `[start, end)` interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub party_size: i32,
}

impl BookedInterval {
    /// An end at or before the start is taken to fall on the next day.
    pub fn from_reservation(r: &Reservation, tz: Tz) -> Result<Self, TimeError> {
        let start = time::parse_wall_clock(&r.timeslot_start)?;
        let end = time::parse_wall_clock(&r.timeslot_end)?;
        let end_date = if end <= start {
            r.date.succ_opt().unwrap_or(r.date)
        } else {
            r.date
        };
        Ok(Self {
            start: time::to_utc_instant(r.date.and_time(start), tz),
            end: time::to_utc_instant(end_date.and_time(end), tz),
            party_size: r.party_size,
        })
    }

    /// Half-open overlap test
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Convert occupying reservations, skipping rows whose times don't parse
pub fn booked_intervals<'a>(
    reservations: impl IntoIterator<Item = &'a Reservation>,
    tz: Tz,
) -> Vec<BookedInterval> {
    reservations
        .into_iter()
        .filter(|r| r.status.occupies_table())
        .filter_map(|r| match BookedInterval::from_reservation(r, tz) {
            Ok(interval) => Some(interval),
            Err(e) => {
                tracing::warn!(
                    confirmation_code = %r.confirmation_code,
                    error = %e,
                    "Skipping reservation with unreadable times"
                );
                None
            }
        })
        .collect()
}

/// Would a party of `party_size` still find a table during `[start, end)`?
///
/// Overlapping reservations are seated smallest party first; ones that
/// cannot be seated are ignored rather than failing the check.
pub fn is_available(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    booked: &[BookedInterval],
    tables: &[TableType],
    party_size: i32,
    threshold: i32,
) -> bool {
    let mut overlapping: Vec<&BookedInterval> =
        booked.iter().filter(|b| b.overlaps(start, end)).collect();
    overlapping.sort_by_key(|b| b.party_size);

    let mut inventory = Inventory::new(tables);
    for b in overlapping {
        if !inventory.seat(b.party_size, threshold) {
            tracing::debug!(party_size = b.party_size, "Overlapping reservation has no table");
        }
    }
    inventory.can_seat(party_size, threshold)
}

/// Inputs for one date's slot generation
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest<'a> {
    pub date: NaiveDate,
    pub timeslot_length_minutes: i32,
    pub ranges: &'a [TimeRange],
    pub tables: &'a [TableType],
    pub booked: &'a [BookedInterval],
    pub party_size: i32,
    pub tz: Tz,
    pub threshold: i32,
    pub now: DateTime<Utc>,
}

/// Generated slots plus the allocator's diagnostic when the party cannot be
/// seated at all on this date
#[derive(Debug, Clone, PartialEq)]
pub struct SlotOutcome {
    pub slots: Vec<TimeSlot>,
    pub diagnostic: Option<CapacityError>,
}

/// Expand `req.ranges` into ordered, deduplicated slots
pub fn generate_slots(req: &SlotRequest<'_>) -> Result<SlotOutcome, TimeError> {
    let diagnostic = capacity::allocate(req.party_size, req.tables, req.threshold).err();

    if req.timeslot_length_minutes <= 0 {
        tracing::warn!(
            length = req.timeslot_length_minutes,
            "Non-positive timeslot length, no slots generated"
        );
        return Ok(SlotOutcome {
            slots: Vec::new(),
            diagnostic,
        });
    }
    let step = Duration::minutes(i64::from(req.timeslot_length_minutes));

    let mut seen = HashSet::new();
    let mut generated: Vec<(DateTime<Utc>, TimeSlot)> = Vec::new();

    for range in req.ranges {
        let range_start = time::parse_wall_clock(&range.start)?;
        let range_end = time::parse_wall_clock(&range.end)?;
        if range_end <= range_start {
            tracing::warn!(
                start = %range.start,
                end = %range.end,
                "Skipping time range that does not end after it starts"
            );
            continue;
        }

        let boundary = time::to_utc_instant(req.date.and_time(range_end), req.tz);
        let mut cursor = time::to_utc_instant(req.date.and_time(range_start), req.tz);

        while cursor + step <= boundary {
            let slot_start = cursor;
            let slot_end = cursor + step;
            cursor = slot_end;

            if slot_end <= req.now {
                continue;
            }

            let start = time::format_wall_clock(time::to_restaurant_local(slot_start, req.tz).time());
            let end = time::format_wall_clock(time::to_restaurant_local(slot_end, req.tz).time());
            if !seen.insert((start.clone(), end.clone())) {
                continue;
            }

            let available = diagnostic.is_none()
                && is_available(
                    slot_start,
                    slot_end,
                    req.booked,
                    req.tables,
                    req.party_size,
                    req.threshold,
                );
            generated.push((
                slot_start,
                TimeSlot {
                    start,
                    end,
                    available,
                },
            ));
        }
    }

    generated.sort_by_key(|(instant, _)| *instant);
    Ok(SlotOutcome {
        slots: generated.into_iter().map(|(_, slot)| slot).collect(),
        diagnostic,
    })
}

/// Re-check of a slot's capacity performed by the store atomically with the
/// write that claims it
#[derive(Debug, Clone)]
pub struct CapacityGuard {
    pub restaurant_id: Uuid,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub party_size: i32,
    pub tables: Vec<TableType>,
    pub threshold: i32,
    pub tz: Tz,
    /// The reservation being moved, which must not block itself
    pub exclude: Option<Uuid>,
}

impl CapacityGuard {
    /// `others` are the reservations currently stored for the same
    /// restaurant and date.
    pub fn admits(&self, others: &[Reservation]) -> bool {
        let competing = others
            .iter()
            .filter(|r| Some(r.id) != self.exclude && r.restaurant_id == self.restaurant_id);
        let booked = booked_intervals(competing, self.tz);
        is_available(
            self.start,
            self.end,
            &booked,
            &self.tables,
            self.party_size,
            self.threshold,
        )
    }
}
