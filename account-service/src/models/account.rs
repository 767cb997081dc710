//! Account model - one identity per person.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Account entity. Identity attributes are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account.
    pub fn new(name: String, first_name: String, last_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::generate(),
            name,
            first_name,
            last_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name built from first and last name.
    ///
    /// The store names an owner's first organisation with this value, so
    /// callers comparing organisation names must build it the same way.
    pub fn full_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name, last_name)
    }
}
