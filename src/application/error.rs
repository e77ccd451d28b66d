use thiserror::Error;

use crate::{config::LoadError, domain::error::DomainError, infra::error::InfraError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Config(_) => 64,
            AppError::Domain(DomainError::InvalidUrl { .. }) => 65,
            AppError::Domain(DomainError::InvalidConfig { .. }) => 78,
            AppError::Domain(DomainError::FlushInterrupted { .. })
            | AppError::Infra(_)
            | AppError::Unexpected(_) => 1,
        }
    }
}
