//! Registration and login endpoints.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use consumption_core::db::user_queries;
use consumption_core::domain::User;

use crate::auth::{self, jwt};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "auth" }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub message: String,
}

impl UserResponse {
    fn registered(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            message: "User registered successfully".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
    pub message: String,
}

/// Normalized registration data, ready for storage.
#[derive(Debug, PartialEq)]
struct Registration {
    username: String,
    email: String,
    password: String,
}

/// Accepts `local@domain.tld`-shaped addresses; anything stricter belongs to
/// a confirmation-mail flow, not this check.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
}

/// Rules:
/// - username 3-80 chars of letters, digits, `_` or `-`, stored lowercased
/// - email must look like an address, stored lowercased
/// - password 8-128 chars with at least one letter and one digit
/// - confirm_password must match
fn validate_registration(req: &RegisterRequest) -> Result<Registration, BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();

    let username = req.username.trim().to_lowercase();
    if username.len() < 3 || username.len() > 80 {
        errors.insert(
            "username".to_string(),
            "Username must be between 3 and 80 characters".to_string(),
        );
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.insert(
            "username".to_string(),
            "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
        );
    }

    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }

    if req.password.len() < 8 {
        errors.insert(
            "password".to_string(),
            "Password must be at least 8 characters long".to_string(),
        );
    } else if req.password.len() > 128 {
        errors.insert(
            "password".to_string(),
            "Password must be at most 128 characters long".to_string(),
        );
    } else if !req.password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.insert(
            "password".to_string(),
            "Password must contain at least one letter".to_string(),
        );
    } else if !req.password.chars().any(|c| c.is_ascii_digit()) {
        errors.insert(
            "password".to_string(),
            "Password must contain at least one number".to_string(),
        );
    }

    if req.password != req.confirm_password {
        errors.insert(
            "confirm_password".to_string(),
            "Password and confirm password do not match".to_string(),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Registration {
        username,
        email,
        password: req.password.clone(),
    })
}

fn validate_login(req: &LoginRequest) -> Result<(String, String), BTreeMap<String, String>> {
    let mut errors = BTreeMap::new();

    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }
    if req.password.is_empty() {
        errors.insert("password".to_string(), "This field is required".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok((email, req.password.clone()))
}

/// Unique-constraint races on insert map to the same errors as the
/// pre-insert existence checks.
fn map_insert_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_email_key") => return ApiError::EmailExists,
            Some("users_username_key") => return ApiError::UsernameExists,
            _ => {}
        }
    }
    ApiError::Internal(err.into())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    metrics::counter!("auth_register_requests_total").increment(1);

    let Json(request) = payload?;
    let registration = validate_registration(&request).map_err(ApiError::Validation)?;

    if user_queries::find_by_email(&state.pool, &registration.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(ApiError::EmailExists);
    }
    if user_queries::find_by_username(&state.pool, &registration.username)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(ApiError::UsernameExists);
    }

    let Registration {
        username,
        email,
        password,
    } = registration;
    let password_hash = auth::hash_password_blocking(password)
        .await
        .map_err(ApiError::Internal)?;
    let user = user_queries::insert_user(&state.pool, &username, &email, &password_hash)
        .await
        .map_err(map_insert_error)?;

    metrics::counter!("auth_users_registered_total").increment(1);
    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, Json(UserResponse::registered(&user))))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    metrics::counter!("auth_login_requests_total").increment(1);

    let Json(request) = payload?;
    let (email, password) = validate_login(&request).map_err(ApiError::Validation)?;

    // Unknown email and wrong password are indistinguishable on the wire.
    let user = user_queries::find_by_email(&state.pool, &email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::InvalidCredentials)?;

    let password_ok = auth::verify_password_blocking(password, user.password_hash.clone())
        .await
        .map_err(ApiError::Internal)?;
    if !password_ok {
        metrics::counter!("auth_login_failures_total").increment(1);
        return Err(ApiError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(ApiError::InactiveAccount);
    }

    let tokens =
        jwt::issue_tokens(user.id, &state.auth, state.clock.now()).map_err(ApiError::Internal)?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: UserResponse::registered(&user),
        message: "Login successful".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn valid_registration_is_normalized() {
        let req = request("JohnDoe", "John@Example.COM", "Secure123", "Secure123");
        let reg = validate_registration(&req).unwrap();

        assert_eq!(reg.username, "johndoe");
        assert_eq!(reg.email, "john@example.com");
        assert_eq!(reg.password, "Secure123");
    }

    #[test]
    fn short_username_is_rejected() {
        let req = request("ab", "a@b.com", "Secure123", "Secure123");
        let errors = validate_registration(&req).unwrap_err();
        assert!(errors.contains_key("username"));
    }

    #[test]
    fn username_with_spaces_is_rejected() {
        let req = request("john doe", "a@b.com", "Secure123", "Secure123");
        let errors = validate_registration(&req).unwrap_err();
        assert!(errors.contains_key("username"));
    }

    #[test]
    fn bad_email_is_rejected() {
        for email in ["plainaddress", "@no-local.com", "user@", "user@nodot", "a b@c.com"] {
            let req = request("johndoe", email, "Secure123", "Secure123");
            let errors = validate_registration(&req).unwrap_err();
            assert!(errors.contains_key("email"), "accepted {email}");
        }
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let no_digit = request("johndoe", "a@b.com", "OnlyLetters", "OnlyLetters");
        assert!(validate_registration(&no_digit).unwrap_err().contains_key("password"));

        let no_letter = request("johndoe", "a@b.com", "12345678", "12345678");
        assert!(validate_registration(&no_letter).unwrap_err().contains_key("password"));

        let too_short = request("johndoe", "a@b.com", "Ab1", "Ab1");
        assert!(validate_registration(&too_short).unwrap_err().contains_key("password"));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let req = request("johndoe", "a@b.com", "Secure123", "Secure124");
        let errors = validate_registration(&req).unwrap_err();
        assert!(errors.contains_key("confirm_password"));
    }

    #[test]
    fn multiple_failures_report_per_field() {
        let req = request("x", "bad", "short", "other");
        let errors = validate_registration(&req).unwrap_err();
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(errors.contains_key("confirm_password"));
    }

    #[test]
    fn login_validation_normalizes_email() {
        let req = LoginRequest {
            email: " User@Example.com ".to_string(),
            password: "Secure123".to_string(),
        };
        let (email, password) = validate_login(&req).unwrap();
        assert_eq!(email, "user@example.com");
        assert_eq!(password, "Secure123");
    }

    #[test]
    fn login_requires_password_and_valid_email() {
        let req = LoginRequest {
            email: "not-an-email".to_string(),
            password: String::new(),
        };
        let errors = validate_login(&req).unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
    }
}
