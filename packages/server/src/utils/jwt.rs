use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// What a token is good for. Session and reset tokens are signed with the
/// same key but are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

/// JWT claims: the `{id, role}` principal plus purpose and expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i32,
    pub role: String,
    pub purpose: TokenPurpose,
    pub exp: usize,
}

const SESSION_TTL_HOURS: i64 = 24;
const RESET_TTL_HOURS: i64 = 1;

fn sign(uid: i32, role: &str, purpose: TokenPurpose, ttl_hours: i64, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| anyhow::anyhow!("Expiry out of range"))?
        .timestamp();

    let claims = Claims {
        uid,
        role: role.to_owned(),
        purpose,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Sign a 24-hour session token for a logged-in user.
pub fn sign_session(uid: i32, role: &str, secret: &str) -> Result<String> {
    sign(uid, role, TokenPurpose::Session, SESSION_TTL_HOURS, secret)
}

/// Sign a one-hour password-reset token.
pub fn sign_reset(uid: i32, role: &str, secret: &str) -> Result<String> {
    sign(uid, role, TokenPurpose::PasswordReset, RESET_TTL_HOURS, secret)
}

fn verify(token: &str, secret: &str, purpose: TokenPurpose) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.purpose != purpose {
        anyhow::bail!("Token purpose mismatch");
    }
    Ok(token_data.claims)
}

/// Verify a session token and return its claims.
pub fn verify_session(token: &str, secret: &str) -> Result<Claims> {
    verify(token, secret, TokenPurpose::Session)
}

/// Verify a password-reset token and return its claims.
pub fn verify_reset(token: &str, secret: &str) -> Result<Claims> {
    verify(token, secret, TokenPurpose::PasswordReset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn session_token_round_trips() {
        let token = sign_session(42, "admin", SECRET).unwrap();
        let claims = verify_session(&token, SECRET).unwrap();
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn reset_token_is_rejected_for_sessions() {
        let token = sign_reset(42, "user", SECRET).unwrap();
        assert!(verify_session(&token, SECRET).is_err());
        assert!(verify_reset(&token, SECRET).is_ok());
    }

    #[test]
    fn session_token_is_rejected_for_resets() {
        let token = sign_session(42, "user", SECRET).unwrap();
        assert!(verify_reset(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_fails() {
        let token = sign_session(42, "user", SECRET).unwrap();
        assert!(verify_session(&token, "other-secret").is_err());
    }
}
