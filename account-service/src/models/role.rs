//! Membership model - account → organisation → role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AccountId, AccountRoleId, OrganisationId};

/// Organisation roles. An account holds at most one per organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full control of the organisation.
    Owner,
    /// Manages members and settings.
    Admin,
    Member,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[Role::Owner, Role::Admin, Role::Member]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// True if this role has at least the permissions of `other`.
    pub fn has_permission_of(&self, other: &Role) -> bool {
        matches!(
            (self, other),
            (Role::Owner, _)
                | (Role::Admin, Role::Admin | Role::Member)
                | (Role::Member, Role::Member)
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == code)
            .ok_or_else(|| format!("Invalid role: {}", s))
    }
}

/// Account role entity (organisation membership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRole {
    pub id: AccountRoleId,
    pub account_id: AccountId,
    pub organisation_id: OrganisationId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AccountRole {
    /// Create a new membership starting now.
    pub fn new(account_id: AccountId, organisation_id: OrganisationId, role: Role) -> Self {
        Self {
            id: AccountRoleId::generate(),
            account_id,
            organisation_id,
            role,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hierarchy() {
        assert!(Role::Owner.has_permission_of(&Role::Admin));
        assert!(Role::Admin.has_permission_of(&Role::Member));
        assert!(!Role::Admin.has_permission_of(&Role::Owner));
        assert!(!Role::Member.has_permission_of(&Role::Admin));
    }

    #[test]
    fn role_codes() {
        for role in Role::all() {
            assert_eq!(role.as_str().parse::<Role>(), Ok(*role));
        }
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("superuser".parse::<Role>().is_err());
    }
}
