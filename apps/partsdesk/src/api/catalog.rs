//! Products, prices and stock levels.

use super::{ApiError, AppState, CurrentUser, LocationQuery, ok, run_blocking};
use axum::Json;
use axum::extract::{Path, Query, State};
use partsdesk_core::pricing::{self, PriceUpdate};
use partsdesk_core::stock::{self, below_reorder_level, stock_at};
use partsdesk_core::{Product, RecordSource, RoleName};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

pub(super) async fn list_products(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let products = run_blocking(&state, |store| pricing::list_products(store)).await?;
    Ok(ok(products))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let product = run_blocking(&state, move |store| store.require::<Product>(id)).await?;
    Ok(ok(product))
}

pub(super) async fn update_price(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(update): Json<PriceUpdate>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::WarehouseStaff, RoleName::Manager])?;
    let product =
        run_blocking(&state, move |store| pricing::update_price(store, id, update)).await?;
    info!(
        product_id = id,
        price = %product.price,
        on_offer = product.on_offer,
        by = %user.0.username,
        "price updated"
    );
    Ok(ok(product))
}

pub(super) async fn stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ApiError> {
    let location = query.resolve(&user)?;
    let lines = run_blocking(&state, move |store| stock_at(store, location)).await?;
    Ok(ok(lines))
}

pub(super) async fn reorder(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ApiError> {
    let location = query.resolve(&user)?;
    let lines = run_blocking(&state, move |store| below_reorder_level(store, location)).await?;
    Ok(ok(lines))
}

#[derive(Debug, Deserialize)]
pub(super) struct QuantityUpdate {
    quantity: i64,
}

pub(super) async fn set_quantity(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(update): Json<QuantityUpdate>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[
        RoleName::LocalStaff,
        RoleName::WarehouseStaff,
        RoleName::Manager,
    ])?;
    let scope = if user.is_manager() {
        None
    } else {
        Some(user.location()?)
    };
    let stock = run_blocking(&state, move |store| {
        stock::set_quantity(store, id, update.quantity, scope)
    })
    .await?;
    info!(stock_id = id, quantity = stock.quantity, by = %user.0.username, "stock updated");
    Ok(ok(stock))
}
