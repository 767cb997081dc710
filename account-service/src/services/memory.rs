use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    Account, AccountId, AccountRole, AuthProvider, LoginCredential, Organisation, OrganisationId,
    Role,
};
use crate::services::store::{
    AccountStore, AddOrganisationMember, CreateOrganisation, CreateOwnerAccount, NewMember,
    OwnerAccount, StoreError, UpdateOrganisation,
};

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    credentials: Vec<LoginCredential>,
    organisations: Vec<Organisation>,
    roles: Vec<AccountRole>,
}

impl State {
    fn organisation(&self, id: OrganisationId) -> Option<&Organisation> {
        self.organisations.iter().find(|o| o.id == id)
    }

    fn has_account(&self, id: AccountId) -> bool {
        self.accounts.iter().any(|a| a.id == id)
    }

    fn has_role(&self, account_id: AccountId, organisation_id: OrganisationId) -> bool {
        self.roles
            .iter()
            .any(|r| r.account_id == account_id && r.organisation_id == organisation_id)
    }

    /// Mirrors the `LOWER(email)` unique index on the PostgreSQL side.
    fn password_email_taken(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.credentials
            .iter()
            .any(|c| c.provider == AuthProvider::Password && c.email.to_lowercase() == email)
    }

    fn subject_taken(&self, provider: AuthProvider, subject: &str) -> bool {
        self.credentials
            .iter()
            .any(|c| c.provider == provider && c.provider_user_id == subject)
    }

    /// Validate an organisation-with-members write without touching state.
    fn check_members(
        &self,
        owner_id: AccountId,
        members: &[NewMember],
    ) -> Result<(), StoreError> {
        if !self.has_account(owner_id) {
            return Err(StoreError::NotFound(format!("account {}", owner_id)));
        }
        for (i, member) in members.iter().enumerate() {
            if !self.has_account(member.account_id) {
                return Err(StoreError::NotFound(format!("account {}", member.account_id)));
            }
            let repeated = member.account_id == owner_id
                || members[..i].iter().any(|m| m.account_id == member.account_id);
            if repeated {
                return Err(StoreError::Conflict(format!(
                    "account {} listed twice for one organisation",
                    member.account_id
                )));
            }
        }
        Ok(())
    }
}

/// Process-local [`AccountStore`].
///
/// Every trait method holds the state lock for its whole body, which gives
/// the multi-row primitives the same all-or-nothing behaviour as the
/// PostgreSQL store.
pub struct MemoryAccountStore {
    state: Mutex<State>,
    calls: AtomicUsize,
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of [`AccountStore`] calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Insert a pre-existing organisation as-is, e.g. one with no owner.
    pub fn insert_organisation(&self, organisation: Organisation) -> Result<(), StoreError> {
        self.state()?.organisations.push(organisation);
        Ok(())
    }

    /// Insert an account that has no credential or membership yet.
    pub fn insert_account(&self, account: Account) -> Result<(), StoreError> {
        self.state()?.accounts.push(account);
        Ok(())
    }

    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.state()?.accounts.clone())
    }

    pub fn credentials(&self) -> Result<Vec<LoginCredential>, StoreError> {
        Ok(self.state()?.credentials.clone())
    }

    /// All organisations in creation order.
    pub fn organisations(&self) -> Result<Vec<Organisation>, StoreError> {
        Ok(self.state()?.organisations.clone())
    }

    pub fn roles_for_account(&self, account_id: AccountId) -> Result<Vec<AccountRole>, StoreError> {
        Ok(self
            .state()?
            .roles
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect())
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Internal(format!("Memory store mutex poisoned: {}", e)))
    }

    fn begin_call(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.state()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn login_credentials_user_email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.begin_call()?.password_email_taken(email))
    }

    async fn get_organisation(&self, id: OrganisationId) -> Result<Organisation, StoreError> {
        self.begin_call()?
            .organisation(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("organisation {}", id)))
    }

    async fn create_owner_account(
        &self,
        input: CreateOwnerAccount,
    ) -> Result<OwnerAccount, StoreError> {
        let mut state = self.begin_call()?;

        if input.provider == AuthProvider::Password && state.password_email_taken(&input.email) {
            return Err(StoreError::Conflict(format!(
                "credential for {} already exists",
                input.email
            )));
        }

        let account = Account::new(input.name.clone(), input.first_name, input.last_name);
        let credential = LoginCredential::new(
            account.id,
            input.provider,
            input.provider_user_id,
            input.email,
            input.password_hash,
        );
        if state.subject_taken(credential.provider, &credential.provider_user_id) {
            return Err(StoreError::Conflict(format!(
                "{} credential {} already exists",
                credential.provider.as_str(),
                credential.provider_user_id
            )));
        }
        let organisation = Organisation::new(input.name, Some(account.id));
        let role = AccountRole::new(account.id, organisation.id, Role::Owner);

        state.accounts.push(account.clone());
        state.credentials.push(credential.clone());
        state.organisations.push(organisation.clone());
        state.roles.push(role.clone());

        Ok(OwnerAccount {
            account,
            organisation,
            credential,
            role,
        })
    }

    async fn add_organisation_member(
        &self,
        input: AddOrganisationMember,
    ) -> Result<AccountRole, StoreError> {
        let mut state = self.begin_call()?;

        if state.organisation(input.organisation_id).is_none() {
            return Err(StoreError::NotFound(format!(
                "organisation {}",
                input.organisation_id
            )));
        }
        if !state.has_account(input.account_id) {
            return Err(StoreError::NotFound(format!("account {}", input.account_id)));
        }
        if state.has_role(input.account_id, input.organisation_id) {
            return Err(StoreError::Conflict(format!(
                "account {} is already a member of organisation {}",
                input.account_id, input.organisation_id
            )));
        }

        let role = AccountRole::new(input.account_id, input.organisation_id, input.role);
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn create_organisation(
        &self,
        input: CreateOrganisation,
    ) -> Result<Organisation, StoreError> {
        let mut state = self.begin_call()?;
        let owner_id = input.owner_id;
        state.check_members(owner_id, &[])?;

        let organisation = new_organisation(input);
        let owner_role = AccountRole::new(owner_id, organisation.id, Role::Owner);
        state.organisations.push(organisation.clone());
        state.roles.push(owner_role);
        Ok(organisation)
    }

    async fn create_organisation_with_members(
        &self,
        input: CreateOrganisation,
        members: Vec<NewMember>,
    ) -> Result<(Organisation, Vec<AccountRole>), StoreError> {
        let mut state = self.begin_call()?;
        let owner_id = input.owner_id;
        state.check_members(owner_id, &members)?;

        let organisation = new_organisation(input);
        let mut roles = Vec::with_capacity(members.len() + 1);
        roles.push(AccountRole::new(owner_id, organisation.id, Role::Owner));
        roles.extend(
            members
                .iter()
                .map(|m| AccountRole::new(m.account_id, organisation.id, m.role)),
        );

        state.organisations.push(organisation.clone());
        state.roles.extend(roles.iter().cloned());
        Ok((organisation, roles))
    }

    async fn update_organisation(
        &self,
        input: UpdateOrganisation,
    ) -> Result<Organisation, StoreError> {
        let mut state = self.begin_call()?;
        let organisation = state
            .organisations
            .iter_mut()
            .find(|o| o.id == input.id)
            .ok_or_else(|| StoreError::NotFound(format!("organisation {}", input.id)))?;

        if let Some(name) = input.name {
            organisation.name = name;
        }
        if let Some(description) = input.description {
            organisation.description = Some(description);
        }
        if let Some(avatar) = input.avatar {
            organisation.avatar = Some(avatar);
        }
        organisation.updated_at = Utc::now();

        Ok(organisation.clone())
    }

    async fn list_organisation_members(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<AccountRole>, StoreError> {
        let state = self.begin_call()?;
        Ok(state
            .roles
            .iter()
            .filter(|r| r.organisation_id == organisation_id)
            .cloned()
            .collect())
    }
}

fn new_organisation(input: CreateOrganisation) -> Organisation {
    let mut organisation = Organisation::new(input.name, Some(input.owner_id));
    organisation.description = input.description;
    organisation.avatar = input.avatar;
    organisation
}
