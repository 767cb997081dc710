//! Identifier newtypes.
//!
//! Every entity is keyed by a v4 UUID; wrapping them keeps an account id
//! from being passed where an organisation id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random ID.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id_type!(AccountId, "Unique identifier for an account.");
define_id_type!(OrganisationId, "Unique identifier for an organisation.");
define_id_type!(CredentialId, "Unique identifier for a login credential.");
define_id_type!(AccountRoleId, "Unique identifier for an organisation membership.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_the_same_uuid() {
        let raw = "6f1c1b0e-2a57-4a4e-9f43-0d7f5b6f3c21";
        let id: OrganisationId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(Uuid::from(id).to_string(), raw);
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-a-uuid".parse::<AccountId>().is_err());
    }

    #[test]
    fn ids_share_the_uuid_column_type() {
        use sqlx::{Postgres, Type};

        assert_eq!(
            <AccountId as Type<Postgres>>::type_info(),
            <Uuid as Type<Postgres>>::type_info()
        );
        assert!(<Option<OrganisationId> as Type<Postgres>>::compatible(
            &<Uuid as Type<Postgres>>::type_info()
        ));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(AccountId::generate(), AccountId::generate());
    }
}
