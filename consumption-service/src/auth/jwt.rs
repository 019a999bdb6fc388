use anyhow::{bail, Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// HS256 claims. `sub` is the user id as a string, mirroring how the tokens
/// were shaped historically so existing clients keep working.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn issue(
    user_id: i64,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
    now: OffsetDateTime,
) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.unix_timestamp(),
        exp: (now + ttl).unix_timestamp(),
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("failed to sign token")
}

/// Create the access/refresh pair returned on login.
pub fn issue_tokens(user_id: i64, cfg: &AuthConfig, now: OffsetDateTime) -> Result<TokenPair> {
    let access_token = issue(
        user_id,
        TokenType::Access,
        Duration::hours(cfg.access_token_ttl_hours),
        &cfg.jwt_secret,
        now,
    )?;
    let refresh_token = issue(
        user_id,
        TokenType::Refresh,
        Duration::days(cfg.refresh_token_ttl_days),
        &cfg.jwt_secret,
        now,
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Validate an access token and return the user id it names. Refresh tokens
/// are rejected here; they are only good for minting new access tokens.
pub fn verify_access(token: &str, secret: &str) -> Result<i64> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("token rejected")?;

    if data.claims.token_type != TokenType::Access {
        bail!("not an access token");
    }

    data.claims
        .sub
        .parse::<i64>()
        .context("token subject is not a user id")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            access_token_ttl_hours: 24,
            refresh_token_ttl_days: 30,
        }
    }

    #[test]
    fn access_token_round_trips() {
        let cfg = test_config();
        let pair = issue_tokens(42, &cfg, OffsetDateTime::now_utc()).unwrap();

        let user_id = verify_access(&pair.access_token, &cfg.jwt_secret).unwrap();
        assert_eq!(user_id, 42);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let cfg = test_config();
        let pair = issue_tokens(42, &cfg, OffsetDateTime::now_utc()).unwrap();

        assert!(verify_access(&pair.refresh_token, &cfg.jwt_secret).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = test_config();
        let pair = issue_tokens(42, &cfg, OffsetDateTime::now_utc()).unwrap();

        assert!(verify_access(&pair.access_token, "another-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = test_config();
        let issued_at = OffsetDateTime::now_utc() - Duration::days(60);
        let token = issue(
            42,
            TokenType::Access,
            Duration::hours(1),
            &cfg.jwt_secret,
            issued_at,
        )
        .unwrap();

        assert!(verify_access(&token, &cfg.jwt_secret).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_access("not.a.jwt", "unit-test-secret").is_err());
    }
}
