use axum::http::StatusCode;
use thiserror::Error;

use crate::{db::store::StoreError, error::HttpError};

/// Business failure taxonomy. Every expected rejection is a value here so
/// callers can tell "nothing happened" apart from "does not exist"; only
/// infrastructure failures land in `Store`/`ExternalUnavailable`.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyInState(String),

    #[error("{0}")]
    Ineligible(String),

    #[error("You cannot apply your own referral code")]
    SelfReferral,

    #[error("Referral code not found")]
    InvalidCode,

    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::InvalidCode => StatusCode::NOT_FOUND,

            ServiceError::AlreadyInState(_) => StatusCode::CONFLICT,

            ServiceError::Ineligible(_) | ServiceError::SelfReferral => StatusCode::BAD_REQUEST,

            ServiceError::ExternalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            ServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            ServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for HttpError {
    fn from(error: StoreError) -> Self {
        ServiceError::from(error).into()
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        let message = match &error {
            ServiceError::Store(StoreError::Database(err)) => {
                tracing::error!("database error: {}", err);
                "Server error. Please try again later".to_string()
            }
            other => other.to_string(),
        };
        HttpError::new(message, status)
    }
}
