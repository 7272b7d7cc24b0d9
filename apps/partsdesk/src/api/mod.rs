//! # HTTP API
//!
//! JSON over HTTP with axum. Successful responses are
//! `{"success": true, "data": ...}` except import and CSV validation, which
//! return their report objects directly. Failures are rendered by
//! [`ApiError`].
//!
//! Store access is synchronous; handlers run it on the blocking pool through
//! [`run_blocking`].

mod auth;
mod catalog;
mod error;
mod import;
mod reports;
mod session;
mod trade;

pub use error::ApiError;
pub use session::{CurrentUser, SESSION_COOKIE};

use crate::config::Config;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use partsdesk_core::{Location, LocationType, SessionSigner, Store};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub signer: Arc<SessionSigner>,
    pub login_limiter: Arc<DefaultDirectRateLimiter>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: Store, signer: SessionSigner, config: &Config) -> Self {
        let per_minute = NonZeroU32::new(config.login_rate_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            store: Arc::new(store),
            signer: Arc::new(signer),
            login_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            secure_cookies: config.secure_cookies,
        }
    }
}

/// Run store work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> partsdesk_core::Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || work(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

/// `{"success": true, "data": data}`
pub(crate) fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// `?location_type=garage&location_id=1`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationQuery {
    location_type: Option<String>,
    location_id: Option<u64>,
}

impl LocationQuery {
    /// Staff always get their own location; managers must name one.
    pub(crate) fn resolve(&self, user: &CurrentUser) -> Result<Location, ApiError> {
        if !user.is_manager() {
            return user.location();
        }
        match (self.location_type.as_deref(), self.location_id) {
            (Some(kind), Some(id)) => {
                let kind = LocationType::parse(kind).map_err(ApiError::from)?;
                Ok(Location { kind, id })
            }
            _ => Err(ApiError::bad_request(
                "location_type and location_id are required",
            )),
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::get_product))
        .route("/products/{id}/price", patch(catalog::update_price))
        .route("/stock", get(catalog::stock))
        .route("/stock/reorder", get(catalog::reorder))
        .route("/stock/{id}", patch(catalog::set_quantity))
        .route("/orders", get(trade::list_orders).post(trade::place_order))
        .route("/orders/{id}", get(trade::order_details))
        .route("/orders/{id}/status", patch(trade::update_status))
        .route("/sales", get(trade::list_sales).post(trade::record_sale))
        .route("/sales/{id}", get(trade::sale_details))
        .route("/payments", post(trade::record_payment))
        .route("/customers", get(trade::list_customers).post(trade::create_customer))
        .route("/garages", get(trade::list_garages))
        .route("/warehouses", get(trade::list_warehouses))
        .route("/reports/national-sales", get(reports::national_sales))
        .route("/reports/national-stock", get(reports::national_stock))
        .route("/reports/local-sales", get(reports::local_sales))
        .route("/reports/local-stock", get(reports::local_stock))
        .route("/import", post(import::import))
        .route("/validate-csv", post(import::validate_csv));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origins))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard cannot be combined with credentials.
            Ok(value) if value == "*" => {
                warn!(%origin, "ignoring wildcard CORS origin");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, config: &Config) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "PartsDesk API listening");
    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
