//! Session extraction and cookies.
//!
//! A request is authenticated by `Authorization: Bearer <token>` or by the
//! `partsdesk_session` cookie set at login. Both carry the same signed token.

use super::AppState;
use super::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use partsdesk_core::auth::{SessionUser, require_role};
use partsdesk_core::{Location, LocationType, RoleName};

pub const SESSION_COOKIE: &str = "partsdesk_session";

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(ApiError::unauthorized)?;
        let user = state.signer.verify(token)?;
        Ok(Self(user))
    }
}

impl CurrentUser {
    /// `403` unless the caller has one of `roles`.
    pub fn require(&self, roles: &[RoleName]) -> Result<(), ApiError> {
        require_role(&self.0, roles).map_err(ApiError::from)
    }

    pub fn is_manager(&self) -> bool {
        self.0.is_manager()
    }

    /// The caller's own location; staff accounts always have one.
    pub fn location(&self) -> Result<Location, ApiError> {
        self.0
            .location
            .ok_or_else(|| ApiError::Forbidden("Your account has no location".to_string()))
    }

    /// The caller's garage, for garage-only operations.
    pub fn garage_id(&self) -> Result<u64, ApiError> {
        let location = self.location()?;
        if location.kind == LocationType::Garage {
            Ok(location.id)
        } else {
            Err(ApiError::forbidden())
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

/// `Set-Cookie` value carrying a fresh session.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session.
pub fn clear_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
