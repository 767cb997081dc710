//! Admin and owner provisioning.
//!
//! Both entry points create the account through the store's owner-account
//! primitive, which always mints a fresh organisation. Admin provisioning
//! then attaches the account to the organisation the caller asked for and,
//! when that organisation has no owner, mints an owned replacement carrying
//! the same members.

use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    Account, AccountId, AccountRole, AuthProvider, Organisation, OrganisationId, Role,
};
use crate::services::error::ProvisioningError;
use crate::services::store::{
    AccountStore, AddOrganisationMember, CreateOrganisation, CreateOwnerAccount, NewMember,
    OwnerAccount, UpdateOrganisation,
};
use crate::utils::{Argon2Hasher, CredentialHasher, Password};

/// Result of [`ProvisioningService::create_admin_user`].
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedAdmin {
    pub account: Account,
    /// The membership that places the account in the requested organisation,
    /// or the owner role in `replacement` when one was minted.
    pub role: AccountRole,
    /// Owned copy of the requested organisation, minted when the requested
    /// organisation had no owner. The original is left as it was.
    pub replacement: Option<Organisation>,
}

impl ProvisionedAdmin {
    /// Organisation the account ended up administering.
    pub fn organisation_id(&self) -> OrganisationId {
        self.role.organisation_id
    }
}

#[derive(Clone)]
pub struct ProvisioningService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn AccountStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    pub fn with_argon2(store: Arc<dyn AccountStore>) -> Self {
        Self::new(store, Arc::new(Argon2Hasher))
    }

    pub(crate) fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    /// Create an admin account inside an existing organisation.
    #[instrument(skip(self, password, organisation_id), fields(organisation_id = %organisation_id))]
    pub async fn create_admin_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        organisation_id: OrganisationId,
    ) -> Result<ProvisionedAdmin, ProvisioningError> {
        self.ensure_email_available(email).await?;

        let organisation = self
            .store
            .get_organisation(organisation_id)
            .await
            .map_err(|e| ProvisioningError::from_store(e, "failed to get organisation"))?;

        let owner = self
            .create_owner_account(
                email,
                password,
                first_name,
                last_name,
                "failed to create admin user",
            )
            .await?;
        let account = owner.account;

        if owner.role.organisation_id == organisation_id {
            return Ok(ProvisionedAdmin {
                account,
                role: owner.role,
                replacement: None,
            });
        }

        let admin_role = self
            .store
            .add_organisation_member(AddOrganisationMember {
                organisation_id,
                account_id: account.id,
                role: Role::Admin,
            })
            .await
            .map_err(|e| {
                ProvisioningError::from_store(e, "failed to create admin role in organisation")
            })?;

        if !organisation.is_ownerless() {
            tracing::info!(
                account_id = %account.id,
                organisation_id = %organisation_id,
                "Admin user added to organisation"
            );
            return Ok(ProvisionedAdmin {
                account,
                role: admin_role,
                replacement: None,
            });
        }

        let (replacement, owner_role) = self
            .replace_ownerless_organisation(&organisation, account.id)
            .await?;

        Ok(ProvisionedAdmin {
            account,
            role: owner_role,
            replacement: Some(replacement),
        })
    }

    /// Create an admin account together with a new organisation it owns.
    #[instrument(skip(self, password))]
    pub async fn create_admin_user_with_new_organisation(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        org_name: &str,
    ) -> Result<(Account, Organisation), ProvisioningError> {
        self.ensure_email_available(email).await?;

        let OwnerAccount {
            account,
            mut organisation,
            ..
        } = self
            .create_owner_account(
                email,
                password,
                first_name,
                last_name,
                "failed to create admin user with organisation",
            )
            .await?;

        if organisation.name != org_name {
            self.store
                .update_organisation(UpdateOrganisation::rename(organisation.id, org_name))
                .await
                .map_err(|e| {
                    ProvisioningError::from_store(e, "failed to update organisation name")
                })?;
            organisation.name = org_name.to_string();
        }

        tracing::info!(
            account_id = %account.id,
            organisation_id = %organisation.id,
            "Admin user created with new organisation"
        );

        Ok((account, organisation))
    }

    async fn ensure_email_available(&self, email: &str) -> Result<(), ProvisioningError> {
        let exists = self
            .store
            .login_credentials_user_email_exists(email)
            .await
            .map_err(|e| ProvisioningError::from_store(e, "error checking if user exists"))?;

        if exists {
            return Err(ProvisioningError::Conflict(format!(
                "user with email {} already exists",
                email
            )));
        }
        Ok(())
    }

    /// Hash the password and run the store's owner-account primitive.
    async fn create_owner_account(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        context: &'static str,
    ) -> Result<OwnerAccount, ProvisioningError> {
        let password_hash = self
            .hasher
            .hash(&Password::new(password))
            .map_err(|e| ProvisioningError::Internal(e.context("failed to hash password")))?;

        self.store
            .create_owner_account(CreateOwnerAccount {
                name: Account::full_name(first_name, last_name),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                provider: AuthProvider::Password,
                email: email.to_string(),
                password_hash: Some(password_hash.into_string()),
                provider_user_id: String::new(),
            })
            .await
            .map_err(|e| ProvisioningError::from_store(e, context))
    }

    /// Mint an organisation owned by `owner_id` with the same content and
    /// members as `original`. Creation and member copy are one store call.
    async fn replace_ownerless_organisation(
        &self,
        original: &Organisation,
        owner_id: AccountId,
    ) -> Result<(Organisation, AccountRole), ProvisioningError> {
        let members = self
            .store
            .list_organisation_members(original.id)
            .await
            .map_err(|e| ProvisioningError::from_store(e, "failed to list organisation members"))?;

        let carried: Vec<NewMember> = members
            .into_iter()
            .filter(|m| m.account_id != owner_id)
            .map(|m| NewMember {
                account_id: m.account_id,
                role: m.role,
            })
            .collect();
        let carried_count = carried.len();

        let (replacement, roles) = self
            .store
            .create_organisation_with_members(
                CreateOrganisation {
                    name: original.name.clone(),
                    owner_id,
                    description: original.description.clone(),
                    avatar: original.avatar.clone(),
                },
                carried,
            )
            .await
            .map_err(|e| {
                ProvisioningError::from_store(e, "failed to create organisation with new owner")
            })?;

        let owner_role = roles
            .into_iter()
            .find(|r| r.account_id == owner_id && r.role.has_permission_of(&Role::Owner))
            .ok_or_else(|| {
                ProvisioningError::Internal(anyhow::anyhow!(
                    "replacement organisation {} has no owner role",
                    replacement.id
                ))
            })?;

        // The original keeps its rows; nothing marks it superseded yet.
        tracing::warn!(
            original_organisation_id = %original.id,
            replacement_organisation_id = %replacement.id,
            owner_id = %owner_id,
            carried_members = carried_count,
            "Ownerless organisation replaced by an owned copy"
        );

        Ok((replacement, owner_role))
    }
}
