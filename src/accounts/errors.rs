use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::accounts::{
    repo::StoreError, repo_types::UniqueField, tokens::TokenError, validation::ValidationError,
};

/// Outcome classes of the account use-cases.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("bad request: {0}")]
    BadInput(String),
    #[error("{0} already registered")]
    Conflict(UniqueField),
    #[error("account not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::BadInput(_) => StatusCode::BAD_REQUEST,
            AccountError::Conflict(_) => StatusCode::CONFLICT,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::Unauthorized => StatusCode::UNAUTHORIZED,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccountError::BadInput(_) => "BAD_INPUT",
            AccountError::Conflict(UniqueField::Email) => "EMAIL_TAKEN",
            AccountError::Conflict(UniqueField::UserName) => "USERNAME_TAKEN",
            AccountError::Conflict(UniqueField::Phone) => "PHONE_TAKEN",
            AccountError::NotFound => "NOT_FOUND",
            AccountError::Unauthorized => "UNAUTHORIZED",
            AccountError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<ValidationError> for AccountError {
    fn from(e: ValidationError) -> Self {
        AccountError::BadInput(e.to_string())
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(field) => AccountError::Conflict(field),
            StoreError::NotFound => AccountError::NotFound,
            StoreError::Database(e) => AccountError::Internal(e.to_string()),
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(e: TokenError) -> Self {
        AccountError::Internal(e.to_string())
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AccountError::Internal(detail) => {
                error!(error = %detail, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}
