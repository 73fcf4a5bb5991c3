//! API error taxonomy and its HTTP mapping.
//!
//! Client-caused failures (4xx) answer with their own message.
//! Store/delivery/internal failures are logged with full detail and answer
//! with a generic body so internals never reach the client.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::mail::MailError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Email already in use")]
    DuplicateEmail,
    /// Deliberately identical for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Please verify your email before logging in")]
    NotVerified,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("No email found in provider profile")]
    MissingEmail,
    #[error("User already verified")]
    AlreadyVerified,
    #[error("Not authorized, no token")]
    Unauthenticated,
    #[error("Forbidden: admin access required")]
    Forbidden,
    /// Valid token whose subject no longer resolves to an account.
    #[error("User not found")]
    UserGone,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("email delivery failed: {0}")]
    Delivery(#[from] MailError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(_) | ApiError::Delivery(_) | ApiError::Internal(_) => {
                "Internal Server Error".to_string()
            }
            ApiError::Provider(_) => "Authentication with provider failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail
            | ApiError::InvalidCredentials
            | ApiError::InvalidOrExpiredToken
            | ApiError::MissingEmail
            | ApiError::AlreadyVerified
            | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotVerified | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserGone | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) | ApiError::Delivery(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(self.status_code()).json(json!({"message": self.public_message()}))
    }
}
