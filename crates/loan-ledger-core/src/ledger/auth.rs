//! Password hashing and bearer tokens.
//!
//! Passwords are stored as `sha256(salt ":" password)`. Tokens are 32 random
//! bytes, hex encoded; the store only ever sees their SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LoanLedgerError;
use crate::LoanLedgerResult;

const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

/// A freshly issued bearer token. The plain value is only available here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn new_salt() -> String {
    random_hex(SALT_BYTES)
}

pub fn hash_password(password: &str, salt: &str) -> String {
    sha256_hex(format!("{salt}:{password}").as_bytes())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

/// Generate a token for `user_id` valid for `ttl_hours` from `now`.
pub fn issue_token(
    user_id: i64,
    now: DateTime<Utc>,
    ttl_hours: i64,
) -> LoanLedgerResult<IssuedToken> {
    let expires_at = Duration::try_hours(ttl_hours)
        .filter(|ttl| *ttl > Duration::zero())
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| LoanLedgerError::InvalidInput {
            field: "token_ttl_hours".into(),
            reason: format!("Cannot issue a token valid for {ttl_hours} hours"),
        })?;
    Ok(IssuedToken {
        token: random_hex(TOKEN_BYTES),
        user_id,
        expires_at,
    })
}

/// Digest under which a token is stored and looked up.
pub fn token_digest(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Accepts `"Bearer <token>"` or a bare token.
pub fn strip_bearer(header: &str) -> &str {
    let trimmed = header.trim();
    trimmed
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn random_hex(len: usize) -> String {
    (0..len).map(|_| format!("{:02x}", rand::random::<u8>())).collect()
}
