use super::session::{clear_cookie, session_cookie};
use super::{ApiError, AppState, CurrentUser, run_blocking};
use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use partsdesk_core::auth::authenticate;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.login_limiter.check().is_err() {
        warn!("login rate limit reached");
        return Err(ApiError::RateLimited);
    }
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let username = request.username.clone();
    let outcome = run_blocking(&state, move |store| {
        authenticate(store, &request.username, &request.password)
    })
    .await;
    let user = match outcome {
        Ok(user) => user,
        Err(err) => {
            warn!(%username, "login failed");
            return Err(err);
        }
    };

    let token = state.signer.issue(&user)?;
    info!(%username, role = %user.role, "login");

    let cookie = session_cookie(&token, state.signer.ttl_secs(), state.secure_cookies);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

pub(super) async fn logout(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!(username = %user.0.username, "logout");
    (
        [(SET_COOKIE, clear_cookie(state.secure_cookies))],
        Json(json!({ "success": true })),
    )
}

pub(super) async fn me(user: CurrentUser) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user.0 }))
}
