use account_service::{
    config::{admin_password, AccountConfig},
    db,
    models::OrganisationId,
    services::{PgAccountStore, ProvisioningService},
};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "account-service")]
#[command(about = "Provision admin accounts and their organisations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured bootstrap admin if it does not exist yet (default)
    Bootstrap,
    /// Create an admin inside an existing organisation (password from ADMIN_PASSWORD)
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Organisation UUID
        #[arg(long)]
        organisation_id: OrganisationId,
    },
    /// Create an admin that owns a new organisation (password from ADMIN_PASSWORD)
    CreateOwner {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        org_name: String,
    },
}

fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("failed to serialize output: {}", e)))?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // Load configuration - fail fast if invalid
    let config = AccountConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting account service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;

    let store = Arc::new(PgAccountStore::new(pool));
    let provisioning = ProvisioningService::with_argon2(store);

    let result = run(
        cli.command.unwrap_or(Commands::Bootstrap),
        &provisioning,
        &config,
    )
    .await;

    if let Err(e) = &result {
        tracing::error!(kind = e.kind(), error = %e, "Account service command failed");
    }
    result
}

async fn run(
    command: Commands,
    provisioning: &ProvisioningService,
    config: &AccountConfig,
) -> Result<(), AppError> {
    match command {
        Commands::Bootstrap => {
            let outcome = provisioning.bootstrap_admin(&config.bootstrap).await?;
            tracing::info!(provisioned = outcome.is_provisioned(), "Bootstrap finished");
            print_json(&outcome)
        }
        Commands::CreateAdmin {
            email,
            first_name,
            last_name,
            organisation_id,
        } => {
            let password = admin_password()?;
            let admin = provisioning
                .create_admin_user(
                    &email,
                    password.expose_secret(),
                    &first_name,
                    &last_name,
                    organisation_id,
                )
                .await?;
            print_json(&admin)
        }
        Commands::CreateOwner {
            email,
            first_name,
            last_name,
            org_name,
        } => {
            let password = admin_password()?;
            let (account, organisation) = provisioning
                .create_admin_user_with_new_organisation(
                    &email,
                    password.expose_secret(),
                    &first_name,
                    &last_name,
                    &org_name,
                )
                .await?;
            print_json(&serde_json::json!({
                "account": account,
                "organisation": organisation,
            }))
        }
    }
}
