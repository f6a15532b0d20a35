//! Time slot model (derived, never persisted)

use serde::{Deserialize, Serialize};

/// A bookable window on a date, in restaurant-local wall clock ("HH:MM")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
    pub available: bool,
}
