//! Organisation model - the tenant container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, OrganisationId};

/// Organisation entity.
///
/// `owner_id` may be unset. An ownerless organisation is a valid state and
/// drives the replacement path in admin provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub name: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub owner_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organisation {
    /// Create a new organisation.
    pub fn new(name: String, owner_id: Option<AccountId>) -> Self {
        let now = Utc::now();
        Self {
            id: OrganisationId::generate(),
            name,
            description: None,
            avatar: None,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_ownerless(&self) -> bool {
        self.owner_id.is_none()
    }

    pub fn is_owned_by(&self, account_id: AccountId) -> bool {
        self.owner_id == Some(account_id)
    }
}
