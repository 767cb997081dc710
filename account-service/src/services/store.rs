//! Account store seam.
//!
//! Provisioning only ever talks to persistence through [`AccountStore`].
//! Implementations must make each method atomic on its own; in particular
//! `create_owner_account` and `create_organisation_with_members` either
//! write every row or none.

use async_trait::async_trait;

use crate::models::{
    Account, AccountId, AccountRole, AuthProvider, LoginCredential, Organisation, OrganisationId,
    Role,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal: {0}")]
    Internal(String),
}

/// Input for [`AccountStore::create_owner_account`].
#[derive(Debug, Clone)]
pub struct CreateOwnerAccount {
    /// Account display name; also used as the new organisation's name.
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub provider: AuthProvider,
    pub email: String,
    pub password_hash: Option<String>,
    /// Empty for password credentials; the store substitutes the email.
    pub provider_user_id: String,
}

/// Everything `create_owner_account` writes.
#[derive(Debug, Clone)]
pub struct OwnerAccount {
    pub account: Account,
    pub organisation: Organisation,
    pub credential: LoginCredential,
    pub role: AccountRole,
}

#[derive(Debug, Clone)]
pub struct AddOrganisationMember {
    pub organisation_id: OrganisationId,
    pub account_id: AccountId,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct CreateOrganisation {
    pub name: String,
    pub owner_id: AccountId,
    pub description: Option<String>,
    pub avatar: Option<String>,
}

/// Partial update; `None` leaves the column as it is.
#[derive(Debug, Clone)]
pub struct UpdateOrganisation {
    pub id: OrganisationId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
}

impl UpdateOrganisation {
    pub fn rename(id: OrganisationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            description: None,
            avatar: None,
        }
    }
}

/// A membership to carry into a newly created organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMember {
    pub account_id: AccountId,
    pub role: Role,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Whether a password credential exists for `email` (case-insensitive).
    async fn login_credentials_user_email_exists(&self, email: &str) -> Result<bool, StoreError>;

    async fn get_organisation(&self, id: OrganisationId) -> Result<Organisation, StoreError>;

    /// Create an account, its credential, an organisation named after the
    /// account and an owner role in that organisation, atomically.
    /// A duplicate (provider, email) is a [`StoreError::Conflict`].
    async fn create_owner_account(
        &self,
        input: CreateOwnerAccount,
    ) -> Result<OwnerAccount, StoreError>;

    async fn add_organisation_member(
        &self,
        input: AddOrganisationMember,
    ) -> Result<AccountRole, StoreError>;

    /// Create an organisation; the owner is recorded with an owner role.
    async fn create_organisation(
        &self,
        input: CreateOrganisation,
    ) -> Result<Organisation, StoreError>;

    /// Create an organisation plus its owner role and every listed member
    /// role as one unit. Roles come back owner first, then `members` in order.
    async fn create_organisation_with_members(
        &self,
        input: CreateOrganisation,
        members: Vec<NewMember>,
    ) -> Result<(Organisation, Vec<AccountRole>), StoreError>;

    async fn update_organisation(
        &self,
        input: UpdateOrganisation,
    ) -> Result<Organisation, StoreError>;

    /// Memberships of an organisation in insertion order.
    async fn list_organisation_members(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<AccountRole>, StoreError>;
}
