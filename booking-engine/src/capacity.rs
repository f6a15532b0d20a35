//! Table capacity allocation
//!
//! [`allocate`] answers "which table sizes may seat this party". The
//! [`Inventory`] is the mutable copy used when simulating how existing
//! reservations were seated.

use serde::Serialize;
use shared::models::TableType;
use thiserror::Error;

/// Default slack: a party may take a table at most one seat larger
pub const DEFAULT_THRESHOLD: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CapacityError {
    #[error("No tables configured")]
    NoTablesConfigured,

    #[error("No table can seat the party (largest table seats {max_capacity})")]
    NoSuitableTable { max_capacity: i32 },
}

/// Result of a successful allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Smallest capacity that fits the party
    pub optimal_capacity: i32,
    /// Tables interchangeable for this party
    pub total_quantity: i32,
    pub matching: Vec<TableType>,
}

fn usable(inventory: &[TableType]) -> Vec<TableType> {
    let mut tables: Vec<TableType> = inventory
        .iter()
        .copied()
        .filter(|t| t.capacity > 0 && t.quantity > 0)
        .collect();
    tables.sort_by_key(|t| t.capacity);
    tables
}

/// Decide which table sizes can serve `party_size`
///
/// Entries with capacity in `[party_size, optimal + threshold]` count as
/// interchangeable.
pub fn allocate(
    party_size: i32,
    inventory: &[TableType],
    threshold: i32,
) -> Result<Allocation, CapacityError> {
    let tables = usable(inventory);
    let Some(max_capacity) = tables.last().map(|t| t.capacity) else {
        return Err(CapacityError::NoTablesConfigured);
    };

    let optimal_capacity = tables
        .iter()
        .map(|t| t.capacity)
        .find(|&c| c >= party_size)
        .ok_or(CapacityError::NoSuitableTable { max_capacity })?;

    let upper = optimal_capacity.saturating_add(threshold.max(0));
    let matching: Vec<TableType> = tables
        .into_iter()
        .filter(|t| t.capacity >= party_size && t.capacity <= upper)
        .collect();
    let total_quantity = matching.iter().map(|t| t.quantity).sum();

    Ok(Allocation {
        optimal_capacity,
        total_quantity,
        matching,
    })
}

/// Remaining tables during a seating simulation, smallest first
#[derive(Debug, Clone)]
pub struct Inventory {
    remaining: Vec<TableType>,
}

impl Inventory {
    pub fn new(tables: &[TableType]) -> Self {
        Self {
            remaining: usable(tables),
        }
    }

    fn fitting(&self, party_size: i32, threshold: i32) -> Option<usize> {
        let upper = party_size.saturating_add(threshold.max(0));
        self.remaining
            .iter()
            .position(|t| t.capacity >= party_size && t.capacity <= upper)
    }

    /// Seat a party on the smallest free table within
    /// `[party_size, party_size + threshold]`. Returns false when none is left.
    pub fn seat(&mut self, party_size: i32, threshold: i32) -> bool {
        let Some(idx) = self.fitting(party_size, threshold) else {
            return false;
        };
        let table = &mut self.remaining[idx];
        table.quantity -= 1;
        if table.quantity == 0 {
            self.remaining.remove(idx);
        }
        true
    }

    pub fn can_seat(&self, party_size: i32, threshold: i32) -> bool {
        self.fitting(party_size, threshold).is_some()
    }

    pub fn remaining(&self) -> &[TableType] {
        &self.remaining
    }
}
