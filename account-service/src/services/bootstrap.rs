//! First-run admin bootstrap.

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;

use crate::config::BootstrapAdminConfig;
use crate::models::{Account, Organisation};
use crate::services::error::ProvisioningError;
use crate::services::provisioning::ProvisioningService;

pub const DEFAULT_FIRST_NAME: &str = "Admin";
pub const DEFAULT_LAST_NAME: &str = "User";
pub const DEFAULT_ORGANISATION_NAME: &str = "Default Organization";

/// What a bootstrap run did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// No bootstrap email configured.
    Disabled,
    /// A password credential for the email already exists.
    AlreadyBootstrapped,
    /// Email configured without a password; nothing written.
    MissingPassword,
    Provisioned {
        account: Account,
        organisation: Organisation,
    },
}

impl BootstrapOutcome {
    pub fn is_provisioned(&self) -> bool {
        matches!(self, BootstrapOutcome::Provisioned { .. })
    }
}

/// Split a display name on whitespace into first and last name.
///
/// The first word is the first name and the remaining words, single-space
/// joined, the last name. Missing parts fall back to "Admin" and "User".
pub fn split_full_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or(DEFAULT_FIRST_NAME).to_string();
    let rest: Vec<&str> = words.collect();
    let last = if rest.is_empty() {
        DEFAULT_LAST_NAME.to_string()
    } else {
        rest.join(" ")
    };
    (first, last)
}

impl ProvisioningService {
    /// Create the configured admin and its organisation unless an account
    /// with that email already exists. Safe to run on every start.
    #[instrument(skip(self, config), fields(email = %config.email))]
    pub async fn bootstrap_admin(
        &self,
        config: &BootstrapAdminConfig,
    ) -> Result<BootstrapOutcome, ProvisioningError> {
        let email = config.email.trim();
        if email.is_empty() {
            tracing::debug!("Bootstrap admin email not set, skipping bootstrap");
            return Ok(BootstrapOutcome::Disabled);
        }

        let exists = self
            .store()
            .login_credentials_user_email_exists(email)
            .await
            .map_err(|e| {
                let err = ProvisioningError::from_store(e, "error checking if user exists");
                tracing::error!(error = %err, "Failed to check for existing bootstrap admin");
                err
            })?;
        if exists {
            tracing::info!("Admin user already exists, skipping bootstrap");
            return Ok(BootstrapOutcome::AlreadyBootstrapped);
        }

        let password = config.password.expose_secret();
        if password.is_empty() {
            tracing::warn!("Bootstrap admin password not set, skipping bootstrap");
            return Ok(BootstrapOutcome::MissingPassword);
        }

        let (first_name, last_name) = split_full_name(&config.name);
        let org_name = match config.org_name.trim() {
            "" => DEFAULT_ORGANISATION_NAME,
            name => name,
        };

        match self
            .create_admin_user_with_new_organisation(
                email,
                password,
                &first_name,
                &last_name,
                org_name,
            )
            .await
        {
            Ok((account, organisation)) => {
                tracing::info!(
                    account_id = %account.id,
                    organisation_id = %organisation.id,
                    organisation_name = %organisation.name,
                    "Bootstrap admin user created"
                );
                Ok(BootstrapOutcome::Provisioned {
                    account,
                    organisation,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create bootstrap admin user");
                Err(e)
            }
        }
    }
}
