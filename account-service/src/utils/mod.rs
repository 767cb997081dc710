pub mod password;

pub use password::{
    hash_password, verify_password, Argon2Hasher, CredentialHasher, Password, PasswordHashString,
};
