//! Customer Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer identity, deduplicated by email
///
/// Name and phone variants accumulate; nothing is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub names: Vec<String>,
    pub phones: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(email: &str, name: &str, phone: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            names: vec![name.to_string()],
            phones: vec![phone.to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append name/phone if unseen. Returns whether anything changed.
    pub fn merge(&mut self, name: &str, phone: &str, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
            changed = true;
        }
        if !self.phones.iter().any(|p| p == phone) {
            self.phones.push(phone.to_string());
            changed = true;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}
