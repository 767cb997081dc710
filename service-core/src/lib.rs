//! service-core: shared error, configuration and logging plumbing.
pub mod config;
pub mod error;
pub mod observability;
