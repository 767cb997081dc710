use service_core::error::AppError;
use thiserror::Error;

use crate::services::store::StoreError;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl ProvisioningError {
    /// Wrap a store failure with what the caller was doing.
    ///
    /// Conflicts and missing rows keep their kind; everything else is
    /// internal with the original error as its cause.
    pub fn from_store(err: StoreError, context: &'static str) -> Self {
        match err {
            StoreError::Conflict(msg) => ProvisioningError::Conflict(format!("{}: {}", context, msg)),
            StoreError::NotFound(msg) => ProvisioningError::NotFound(format!("{}: {}", context, msg)),
            other => ProvisioningError::Internal(anyhow::Error::new(other).context(context)),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ProvisioningError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisioningError::NotFound(_))
    }
}

impl From<ProvisioningError> for AppError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ProvisioningError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            ProvisioningError::Internal(e) => AppError::InternalError(e),
        }
    }
}
