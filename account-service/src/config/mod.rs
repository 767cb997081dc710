use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::DEFAULT_ORGANISATION_NAME;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub database: DatabaseConfig,
    pub bootstrap: BootstrapAdminConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Admin created on first start. An empty `email` turns bootstrap off and an
/// empty `password` skips it with a warning.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: Secret<String>,
    pub name: String,
    pub org_name: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: Secret::new(String::new()),
            name: String::new(),
            org_name: DEFAULT_ORGANISATION_NAME.to_string(),
        }
    }
}

impl AccountConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_source(common_config, |key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_source<F>(common: core_config::Config, vars: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { vars };

        let environment: Environment = env
            .var("ENVIRONMENT")
            .unwrap_or_else(|| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AccountConfig {
            common,
            environment: environment.clone(),
            service_name: env.get("SERVICE_NAME", Some("account-service"), is_prod)?,
            service_version: env.get(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            database: DatabaseConfig {
                url: Secret::new(env.get("DATABASE_URL", None, is_prod)?),
                max_connections: parse_number(
                    "DATABASE_MAX_CONNECTIONS",
                    env.get("DATABASE_MAX_CONNECTIONS", Some("10"), false)?,
                )?,
                min_connections: parse_number(
                    "DATABASE_MIN_CONNECTIONS",
                    env.get("DATABASE_MIN_CONNECTIONS", Some("1"), false)?,
                )?,
            },
            bootstrap: BootstrapAdminConfig {
                email: env.optional("BOOTSTRAP_ADMIN_EMAIL"),
                password: Secret::new(env.optional("BOOTSTRAP_ADMIN_PASSWORD")),
                name: env.optional("BOOTSTRAP_ADMIN_NAME"),
                org_name: env
                    .var("BOOTSTRAP_ADMIN_ORG_NAME")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ORGANISATION_NAME.to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MAX_CONNECTIONS must be greater than 0"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        Ok(())
    }

    /// Non-fatal findings, logged by the caller once tracing is installed.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.environment == Environment::Prod && !self.bootstrap.email.trim().is_empty() {
            warnings.push(
                "Bootstrap admin is configured in production - unset it once the first admin exists",
            );
        }
        warnings
    }
}

/// Password for `create-admin` and `create-owner`, read from `ADMIN_PASSWORD`
/// so it never appears in the process arguments.
pub fn admin_password() -> Result<Secret<String>, AppError> {
    admin_password_from(|key| env::var(key).ok())
}

pub fn admin_password_from<F>(vars: F) -> Result<Secret<String>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match vars("ADMIN_PASSWORD") {
        Some(password) if !password.is_empty() => Ok(Secret::new(password)),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "ADMIN_PASSWORD must be set to create an admin"
        ))),
    }
}

struct Env<F> {
    vars: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        (self.vars)(key)
    }

    fn optional(&self, key: &str) -> String {
        self.var(key).unwrap_or_default()
    }

    fn get(&self, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
        match self.var(key) {
            Some(val) => Ok(val),
            None => {
                if is_prod {
                    Err(AppError::ConfigError(anyhow::anyhow!(format!(
                        "{} is required in production but not set",
                        key
                    ))))
                } else if let Some(def) = default {
                    Ok(def.to_string())
                } else {
                    Err(AppError::ConfigError(anyhow::anyhow!(format!(
                        "{} is required but not set",
                        key
                    ))))
                }
            }
        }
    }
}

fn parse_number(key: &str, value: String) -> Result<u32, AppError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| {
        AppError::ConfigError(anyhow::anyhow!("{} is not a valid number: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
