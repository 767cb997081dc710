//! Integration tests for first-run admin bootstrap.

mod common;

use account_service::config::BootstrapAdminConfig;
use account_service::services::{BootstrapOutcome, ProvisioningError};
use common::{FailingHasher, StoreCall, TestApp};
use secrecy::Secret;
use std::sync::Arc;

fn bootstrap_config(
    email: &str,
    password: &str,
    name: &str,
    org_name: &str,
) -> BootstrapAdminConfig {
    BootstrapAdminConfig {
        email: email.to_string(),
        password: Secret::new(password.to_string()),
        name: name.to_string(),
        org_name: org_name.to_string(),
    }
}

#[tokio::test]
async fn empty_email_disables_bootstrap_without_store_calls() {
    let app = TestApp::new();

    let outcome = app
        .service
        .bootstrap_admin(&BootstrapAdminConfig::default())
        .await
        .unwrap();

    assert!(matches!(outcome, BootstrapOutcome::Disabled));
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn creates_configured_admin_and_organisation() {
    let app = TestApp::new();
    let config = bootstrap_config("admin@x.com", "secret", "Jane Doe", "Acme");

    let outcome = app.service.bootstrap_admin(&config).await.unwrap();

    let (account, organisation) = match outcome {
        BootstrapOutcome::Provisioned {
            account,
            organisation,
        } => (account, organisation),
        other => panic!("expected provisioned, got {:?}", other),
    };
    assert_eq!(account.first_name, "Jane");
    assert_eq!(account.last_name, "Doe");
    assert_eq!(organisation.name, "Acme");
    assert_eq!(organisation.owner_id, Some(account.id));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let app = TestApp::new();
    let config = bootstrap_config("admin@x.com", "secret", "Jane Doe", "Acme");

    let first = app.service.bootstrap_admin(&config).await.unwrap();
    assert!(first.is_provisioned());

    let second = app.service.bootstrap_admin(&config).await.unwrap();
    assert!(matches!(second, BootstrapOutcome::AlreadyBootstrapped));

    assert_eq!(app.store.accounts().unwrap().len(), 1);
    assert_eq!(app.organisations_named("Acme").len(), 1);
}

#[tokio::test]
async fn missing_password_skips_without_writing() {
    let app = TestApp::new();
    let config = bootstrap_config("admin@x.com", "", "Jane Doe", "Acme");

    let outcome = app.service.bootstrap_admin(&config).await.unwrap();

    assert!(matches!(outcome, BootstrapOutcome::MissingPassword));
    assert!(app.store.accounts().unwrap().is_empty());
    assert_eq!(app.store.calls(), 1);
}

#[tokio::test]
async fn unset_name_and_organisation_use_defaults() {
    let app = TestApp::new();
    let config = bootstrap_config("admin@x.com", "secret", "", "");

    let outcome = app.service.bootstrap_admin(&config).await.unwrap();

    let (account, organisation) = match outcome {
        BootstrapOutcome::Provisioned {
            account,
            organisation,
        } => (account, organisation),
        other => panic!("expected provisioned, got {:?}", other),
    };
    assert_eq!(account.first_name, "Admin");
    assert_eq!(account.last_name, "User");
    assert_eq!(organisation.name, "Default Organization");
}

#[tokio::test]
async fn multi_word_last_name_is_kept_together() {
    let app = TestApp::new();
    let config = bootstrap_config("admin@x.com", "secret", "Mary  Ann   Van Dyke", "Acme");

    let outcome = app.service.bootstrap_admin(&config).await.unwrap();

    let account = match outcome {
        BootstrapOutcome::Provisioned { account, .. } => account,
        other => panic!("expected provisioned, got {:?}", other),
    };
    assert_eq!(account.first_name, "Mary");
    assert_eq!(account.last_name, "Ann Van Dyke");
}

#[tokio::test]
async fn provisioning_failure_is_returned() {
    let app = TestApp::with_hasher(Arc::new(FailingHasher));
    let config = bootstrap_config("admin@x.com", "secret", "Jane Doe", "Acme");

    let err = app.service.bootstrap_admin(&config).await.unwrap_err();

    assert!(err.to_string().contains("failed to hash password"));
    assert!(app.store.accounts().unwrap().is_empty());
}

#[tokio::test]
async fn existence_check_failure_is_returned_with_context() {
    let app = TestApp::failing_on(StoreCall::EmailExists);
    let config = bootstrap_config("admin@x.com", "secret", "Jane Doe", "Acme");

    let err = app.service.bootstrap_admin(&config).await.unwrap_err();

    assert!(matches!(err, ProvisioningError::Internal(_)));
    assert!(err.to_string().starts_with("error checking if user exists"));
    assert!(app.store.accounts().unwrap().is_empty());
}
