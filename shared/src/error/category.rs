//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Reservation errors (1xxx)
    Reservation,
    /// Capacity / availability errors (2xxx)
    Capacity,
    /// Management-link errors (3xxx)
    Link,
    /// Payment errors (5xxx)
    Payment,
    /// Notification errors (6xxx)
    Notification,
    /// System errors (9xxx, and unassigned ranges)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Reservation,
            2000..3000 => Self::Capacity,
            3000..4000 => Self::Link,
            5000..6000 => Self::Payment,
            6000..7000 => Self::Notification,
            _ => Self::System,
        }
    }

    /// Get the category name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Reservation => "reservation",
            Self::Capacity => "capacity",
            Self::Link => "link",
            Self::Payment => "payment",
            Self::Notification => "notification",
            Self::System => "system",
        }
    }
}

impl From<ErrorCode> for ErrorCategory {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code.code())
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
