//! Login credential model - authentication methods bound to an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, CredentialId};

/// Authentication provider codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Password,
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Password => "password",
            AuthProvider::Google => "google",
        }
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "password" => Ok(AuthProvider::Password),
            "google" => Ok(AuthProvider::Google),
            _ => Err(format!("Invalid auth provider: {}", s)),
        }
    }
}

/// Login credential entity.
/// `password_hash` is only present for password credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredential {
    pub id: CredentialId,
    pub account_id: AccountId,
    pub provider: AuthProvider,
    pub provider_user_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoginCredential {
    /// Create a new credential.
    ///
    /// Password credentials without a provider subject use the email as the
    /// subject, so (provider, subject) stays unique.
    pub fn new(
        account_id: AccountId,
        provider: AuthProvider,
        provider_user_id: String,
        email: String,
        password_hash: Option<String>,
    ) -> Self {
        let provider_user_id = if provider_user_id.is_empty() && provider == AuthProvider::Password
        {
            email.clone()
        } else {
            provider_user_id
        };

        Self {
            id: CredentialId::generate(),
            account_id,
            provider,
            provider_user_id,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn is_password(&self) -> bool {
        self.provider == AuthProvider::Password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_code() {
        assert_eq!("PASSWORD".parse::<AuthProvider>(), Ok(AuthProvider::Password));
        assert_eq!(AuthProvider::Google.as_str(), "google");
        assert!("saml".parse::<AuthProvider>().is_err());
    }

    #[test]
    fn password_credential_defaults_subject_to_email() {
        let cred = LoginCredential::new(
            AccountId::generate(),
            AuthProvider::Password,
            String::new(),
            "admin@x.com".to_string(),
            Some("$argon2id$...".to_string()),
        );
        assert_eq!(cred.provider_user_id, "admin@x.com");
        assert!(cred.is_password());
    }

    #[test]
    fn hash_is_not_serialized() {
        let cred = LoginCredential::new(
            AccountId::generate(),
            AuthProvider::Password,
            String::new(),
            "admin@x.com".to_string(),
            Some("secret-hash".to_string()),
        );
        let json = serde_json::to_string(&cred).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
