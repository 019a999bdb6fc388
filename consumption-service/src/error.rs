use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Every failure a handler can surface, mapped one-to-one onto the
/// `{error, message, details?}` JSON body the API speaks.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("Invalid JSON payload")]
    InvalidJson,
    #[error("An account with this email already exists")]
    EmailExists,
    #[error("This username is already taken")]
    UsernameExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User account is deactivated")]
    InactiveAccount,
    #[error("User account is deactivated")]
    InactiveUser,
    #[error("User not found")]
    UserNotFound,
    #[error("Authorization token is required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("An unexpected error occurred")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, String>>,
}

impl ApiError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidJson => "invalid_json",
            ApiError::EmailExists => "email_exists",
            ApiError::UsernameExists => "username_exists",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::InactiveAccount => "inactive_account",
            ApiError::InactiveUser => "inactive_user",
            ApiError::UserNotFound => "user_not_found",
            ApiError::MissingToken => "missing_token",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidJson
            | ApiError::EmailExists
            | ApiError::UsernameExists
            | ApiError::InvalidCredentials
            | ApiError::InactiveAccount => StatusCode::BAD_REQUEST,
            ApiError::InactiveUser | ApiError::MissingToken | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            tracing::error!(error = %err, "request failed with internal error");
            metrics::counter!("api_internal_errors_total").increment(1);
        }

        let details = match &self {
            ApiError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError::InvalidJson
    }
}
