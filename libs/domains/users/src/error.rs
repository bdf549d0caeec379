use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::errors::error_response;
use thiserror::Error;

/// Name message reported by create.
pub const NAME_REQUIRED: &str = "Name is required and must be a string";
/// Name message reported by update.
pub const NAME_NON_EMPTY: &str = "Name must be a non-empty string";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("No data provided")]
    MissingPayload,

    #[error("{0}")]
    InvalidName(&'static str),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Age must be an integer between 0 and 120")]
    InvalidAge,

    #[error("Email already exists")]
    DuplicateEmail(String),

    #[error("User not found")]
    NotFound(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Stable identifier used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UserError::MissingPayload => "missing_payload",
            UserError::InvalidName(_) => "invalid_name",
            UserError::InvalidEmail => "invalid_email",
            UserError::InvalidAge => "invalid_age",
            UserError::DuplicateEmail(_) => "duplicate_email",
            UserError::NotFound(_) => "not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match &self {
            UserError::NotFound(id) => {
                tracing::info!(user_id = %id, kind = self.kind(), "User lookup failed");
            }
            UserError::DuplicateEmail(email) => {
                tracing::info!(%email, kind = self.kind(), "User rejected");
            }
            _ => tracing::info!(kind = self.kind(), "User rejected"),
        }

        error_response(self.status(), self.to_string())
    }
}
