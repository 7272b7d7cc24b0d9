//! # Authentication
//!
//! Password checks, signed session tokens and role checks.
//!
//! Password hashes are hex SHA-256, the format the `users.password_hash`
//! import column carries. A session token is
//! `base64url(claims JSON) "." base64url(HMAC-SHA256(secret, payload))`;
//! the claims carry the session user and an expiry timestamp.

use crate::error::{CoreError, Result};
use crate::model::{Location, Role, RoleName, User};
use crate::storage::RecordSource;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime when none is configured: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hex SHA-256 of `password`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Constant-time comparison against a stored hex hash.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password);
    let stored = stored_hash.trim().to_ascii_lowercase();
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}

// =============================================================================
// SESSION USER
// =============================================================================

/// The signed-in user as carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: u64,
    pub username: String,
    pub role: RoleName,
    /// `None` for managers.
    pub location: Option<Location>,
    pub permissions: Vec<String>,
}

impl SessionUser {
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.role == RoleName::Manager
    }

    /// Managers hold every permission; others hold their role's list.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_manager() || self.permissions.iter().any(|p| p == permission)
    }
}

/// `Forbidden` unless the user's role is one of `allowed`.
pub fn require_role(user: &SessionUser, allowed: &[RoleName]) -> Result<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// A role's permission list. Malformed JSON grants nothing.
#[must_use]
pub fn role_permissions(role: &Role) -> Vec<String> {
    serde_json::from_str(&role.permissions).unwrap_or_default()
}

/// Check a username and password against the users table.
pub fn authenticate(
    source: &impl RecordSource,
    username: &str,
    password: &str,
) -> Result<SessionUser> {
    let user = source
        .list::<User>()?
        .into_iter()
        .find(|u| u.username == username);

    let Some(user) = user else {
        return Err(CoreError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        return Err(CoreError::InvalidCredentials);
    }

    let role: Role = source.require(user.role_id)?;
    let role_name = RoleName::parse(&role.name)
        .ok_or_else(|| CoreError::Forbidden(format!("Unknown role: {}", role.name)))?;

    Ok(SessionUser {
        user_id: user.user_id,
        username: user.username,
        role: role_name,
        location: user.location,
        permissions: role_permissions(&role),
    })
}

// =============================================================================
// SESSION TOKENS
// =============================================================================

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    user: SessionUser,
    /// Unix seconds after which the token is rejected.
    exp: i64,
}

/// Issues and verifies HMAC-signed session tokens.
pub struct SessionSigner {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: i64) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
            ttl_secs,
        }
    }

    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &SessionUser) -> Result<String> {
        self.issue_at(user, Utc::now().timestamp())
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| CoreError::InvalidToken)
    }

    fn issue_at(&self, user: &SessionUser, now: i64) -> Result<String> {
        let claims = Claims {
            user: user.clone(),
            exp: now.saturating_add(self.ttl_secs),
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| CoreError::validation(format!("cannot encode session: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<SessionUser> {
        let (payload, signature) = token.split_once('.').ok_or(CoreError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CoreError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CoreError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CoreError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| CoreError::InvalidToken)?;
        if claims.exp <= now {
            return Err(CoreError::SessionExpired);
        }
        Ok(claims.user)
    }
}
