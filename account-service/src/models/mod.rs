pub mod account;
pub mod credential;
pub mod organisation;
pub mod role;
pub mod types;

pub use account::Account;
pub use credential::{AuthProvider, LoginCredential};
pub use organisation::Organisation;
pub use role::{AccountRole, Role};
pub use types::{AccountId, AccountRoleId, CredentialId, OrganisationId};
