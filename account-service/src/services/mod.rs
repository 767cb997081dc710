//! Services layer for account-service.
//!
//! Provisioning logic plus the account store it persists through.

mod bootstrap;
mod database;
pub mod error;
mod memory;
mod provisioning;
pub mod store;

pub use bootstrap::{
    split_full_name, BootstrapOutcome, DEFAULT_FIRST_NAME, DEFAULT_LAST_NAME,
    DEFAULT_ORGANISATION_NAME,
};
pub use database::PgAccountStore;
pub use error::ProvisioningError;
pub use memory::MemoryAccountStore;
pub use provisioning::{ProvisionedAdmin, ProvisioningService};
pub use store::{AccountStore, StoreError};
