//! Bearer-token authentication for protected routes.

pub mod jwt;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use consumption_core::db::user_queries;
use consumption_core::domain::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Check a candidate password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// bcrypt at DEFAULT_COST burns ~100ms of CPU per call; handlers use these
// wrappers so the work lands on the blocking pool, not a runtime worker.

pub async fn hash_password_blocking(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, hash: String) -> anyhow::Result<bool> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}

/// The authenticated caller. Extracting this resolves the `Authorization`
/// header to an active `User` row or rejects the request with the matching
/// API error (missing/invalid token, unknown user, deactivated account).
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingToken)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::MissingToken)?;

        let user_id = jwt::verify_access(token, &state.auth.jwt_secret).map_err(|err| {
            tracing::debug!(error = %err, "access token rejected");
            ApiError::InvalidToken
        })?;

        let user = user_queries::find_by_id(&state.pool, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::UserNotFound)?;

        if !user.is_active {
            return Err(ApiError::InactiveUser);
        }

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("Secure123").unwrap();
        assert!(verify_password("Secure123", &hash));
        assert!(!verify_password("Secure124", &hash));
    }

    #[test]
    fn verify_against_malformed_hash_is_false() {
        assert!(!verify_password("whatever", "not-a-bcrypt-hash"));
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() {
        let hash = hash_password_blocking("Secure123".to_string()).await.unwrap();
        assert!(verify_password_blocking("Secure123".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("Secure124".to_string(), hash).await.unwrap());
    }
}
