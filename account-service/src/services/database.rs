//! PostgreSQL account store.
//!
//! Runtime-checked sqlx queries; multi-row primitives run inside a single
//! transaction so callers see all rows or none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, Transaction};

use crate::models::{
    Account, AccountId, AccountRole, AccountRoleId, AuthProvider, LoginCredential, Organisation,
    OrganisationId, Role,
};
use crate::services::store::{
    AccountStore, AddOrganisationMember, CreateOrganisation, CreateOwnerAccount, NewMember,
    OwnerAccount, StoreError, UpdateOrganisation,
};

#[derive(Debug, FromRow)]
struct OrganisationRow {
    organisation_id: OrganisationId,
    name: String,
    description: Option<String>,
    avatar: Option<String>,
    owner_id: Option<AccountId>,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl From<OrganisationRow> for Organisation {
    fn from(row: OrganisationRow) -> Self {
        Self {
            id: row.organisation_id,
            name: row.name,
            description: row.description,
            avatar: row.avatar,
            owner_id: row.owner_id,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        }
    }
}

#[derive(Debug, FromRow)]
struct AccountRoleRow {
    account_role_id: AccountRoleId,
    account_id: AccountId,
    organisation_id: OrganisationId,
    role_code: String,
    created_utc: DateTime<Utc>,
}

impl TryFrom<AccountRoleRow> for AccountRole {
    type Error = StoreError;

    fn try_from(row: AccountRoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.account_role_id,
            account_id: row.account_id,
            organisation_id: row.organisation_id,
            role: row.role_code.parse::<Role>().map_err(StoreError::Internal)?,
            created_at: row.created_utc,
        })
    }
}

const ORGANISATION_COLUMNS: &str =
    "organisation_id, name, description, avatar, owner_id, created_utc, updated_utc";

/// [`AccountStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool.begin().await.map_err(StoreError::Database)
    }
}

/// Unique violations become conflicts, foreign-key violations a missing parent.
fn map_write_error(e: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", what()))
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            StoreError::NotFound(format!("{} references a missing row", what()))
        }
        other => StoreError::Database(other),
    }
}

async fn insert_organisation(
    tx: &mut Transaction<'static, Postgres>,
    organisation: &Organisation,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO organisations (organisation_id, name, description, avatar, owner_id, created_utc, updated_utc)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(organisation.id)
    .bind(&organisation.name)
    .bind(&organisation.description)
    .bind(&organisation.avatar)
    .bind(organisation.owner_id)
    .bind(organisation.created_at)
    .bind(organisation.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_write_error(e, || format!("organisation {}", organisation.id)))?;
    Ok(())
}

async fn insert_role(
    tx: &mut Transaction<'static, Postgres>,
    role: &AccountRole,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO account_roles (account_role_id, account_id, organisation_id, role_code, created_utc)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(role.id)
    .bind(role.account_id)
    .bind(role.organisation_id)
    .bind(role.role.as_str())
    .bind(role.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        map_write_error(e, || {
            format!(
                "membership of account {} in organisation {}",
                role.account_id, role.organisation_id
            )
        })
    })?;
    Ok(())
}

fn new_organisation(input: CreateOrganisation) -> Organisation {
    let mut organisation = Organisation::new(input.name, Some(input.owner_id));
    organisation.description = input.description;
    organisation.avatar = input.avatar;
    organisation
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn login_credentials_user_email_exists(&self, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM login_credentials
                WHERE provider_code = $1 AND LOWER(email) = LOWER($2)
            )
            "#,
        )
        .bind(AuthProvider::Password.as_str())
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Database)
    }

    async fn get_organisation(&self, id: OrganisationId) -> Result<Organisation, StoreError> {
        sqlx::query_as::<_, OrganisationRow>(&format!(
            "SELECT {} FROM organisations WHERE organisation_id = $1",
            ORGANISATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Organisation::from)
        .ok_or_else(|| StoreError::NotFound(format!("organisation {}", id)))
    }

    async fn create_owner_account(
        &self,
        input: CreateOwnerAccount,
    ) -> Result<OwnerAccount, StoreError> {
        let account = Account::new(input.name.clone(), input.first_name, input.last_name);
        let credential = LoginCredential::new(
            account.id,
            input.provider,
            input.provider_user_id,
            input.email,
            input.password_hash,
        );
        let organisation = Organisation::new(input.name, Some(account.id));
        let role = AccountRole::new(account.id, organisation.id, Role::Owner);

        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, name, first_name, last_name, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, || format!("account {}", account.id)))?;

        sqlx::query(
            r#"
            INSERT INTO login_credentials (credential_id, account_id, provider_code, provider_user_id, email, password_hash, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(credential.id)
        .bind(credential.account_id)
        .bind(credential.provider.as_str())
        .bind(&credential.provider_user_id)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                format!(
                    "{} credential for {}",
                    credential.provider.as_str(),
                    credential.email
                )
            })
        })?;

        insert_organisation(&mut tx, &organisation).await?;
        insert_role(&mut tx, &role).await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account.id,
            organisation_id = %organisation.id,
            provider = credential.provider.as_str(),
            "Owner account created"
        );

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
        let role = AccountRole::new(input.account_id, input.organisation_id, input.role);
        let mut tx = self.begin().await?;
        insert_role(&mut tx, &role).await?;
        tx.commit().await?;
        Ok(role)
    }

    async fn create_organisation(
        &self,
        input: CreateOrganisation,
    ) -> Result<Organisation, StoreError> {
        let (organisation, _) = self.create_organisation_with_members(input, Vec::new()).await?;
        Ok(organisation)
    }

    async fn create_organisation_with_members(
        &self,
        input: CreateOrganisation,
        members: Vec<NewMember>,
    ) -> Result<(Organisation, Vec<AccountRole>), StoreError> {
        let owner_id = input.owner_id;
        let organisation = new_organisation(input);

        let mut roles = Vec::with_capacity(members.len() + 1);
        roles.push(AccountRole::new(owner_id, organisation.id, Role::Owner));
        roles.extend(
            members
                .iter()
                .map(|m| AccountRole::new(m.account_id, organisation.id, m.role)),
        );

        let mut tx = self.begin().await?;
        insert_organisation(&mut tx, &organisation).await?;
        for role in &roles {
            insert_role(&mut tx, role).await?;
        }
        tx.commit().await?;

        tracing::info!(
            organisation_id = %organisation.id,
            owner_id = %owner_id,
            members = roles.len(),
            "Organisation created"
        );

        Ok((organisation, roles))
    }

    async fn update_organisation(
        &self,
        input: UpdateOrganisation,
    ) -> Result<Organisation, StoreError> {
        sqlx::query_as::<_, OrganisationRow>(&format!(
            r#"
            UPDATE organisations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                avatar = COALESCE($4, avatar),
                updated_utc = $5
            WHERE organisation_id = $1
            RETURNING {}
            "#,
            ORGANISATION_COLUMNS
        ))
        .bind(input.id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.avatar)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .map(Organisation::from)
        .ok_or_else(|| StoreError::NotFound(format!("organisation {}", input.id)))
    }

    async fn list_organisation_members(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<AccountRole>, StoreError> {
        sqlx::query_as::<_, AccountRoleRow>(
            r#"
            SELECT account_role_id, account_id, organisation_id, role_code, created_utc
            FROM account_roles
            WHERE organisation_id = $1
            ORDER BY created_utc, account_role_id
            "#,
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AccountRole::try_from)
        .collect()
    }
}
