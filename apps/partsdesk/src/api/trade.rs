//! Orders, sales, payments and the customer/location directory.

use super::{ApiError, AppState, CurrentUser, ok, run_blocking};
use axum::Json;
use axum::extract::{Path, Query, State};
use partsdesk_core::directory::{self, NewCustomer};
use partsdesk_core::orders::{self, NewOrder, OrderLine, OrderScope};
use partsdesk_core::sales::{self, NewSale, SaleLine};
use partsdesk_core::{CoreError, Location, Money, Order, OrderStatus, RecordSource, RoleName, Sale};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

// =============================================================================
// ORDERS
// =============================================================================

pub(super) async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let scope = if user.is_manager() {
        OrderScope::All
    } else {
        OrderScope::Involving(user.location()?)
    };
    let orders = run_blocking(&state, move |store| {
        orders::list_orders(&store.snapshot()?, scope)
    })
    .await?;
    Ok(ok(orders))
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderRequest {
    /// Defaults to the caller's location.
    #[serde(default)]
    from: Option<Location>,
    to: Location,
    #[serde(default)]
    is_emergency: bool,
    items: Vec<OrderLine>,
}

pub(super) async fn place_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<OrderRequest>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::LocalStaff, RoleName::Manager])?;
    let from = if user.is_manager() {
        request
            .from
            .ok_or_else(|| ApiError::bad_request("from is required"))?
    } else {
        let own = user.location()?;
        if request.from.is_some_and(|from| from != own) {
            return Err(ApiError::Forbidden(
                "Orders can only be placed from your own location".to_string(),
            ));
        }
        own
    };

    let new = NewOrder {
        from,
        to: request.to,
        is_emergency: request.is_emergency,
        items: request.items,
    };
    let placed = run_blocking(&state, move |store| orders::place_order(store, &new)).await?;
    info!(
        order_id = placed.order.order_id,
        from = %placed.order.from,
        to = %placed.order.to,
        emergency = placed.order.is_emergency,
        "order placed"
    );
    Ok(ok(placed))
}

pub(super) async fn order_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let viewer = if user.is_manager() {
        None
    } else {
        Some(user.location()?)
    };
    let details = run_blocking(&state, move |store| {
        let snapshot = store.snapshot()?;
        let order: Order = snapshot.require(id)?;
        if viewer.is_some_and(|location| !order.involves(location)) {
            return Err(CoreError::Forbidden(
                "This order does not involve your location".to_string(),
            ));
        }
        orders::order_details(&snapshot, id)
    })
    .await?;
    Ok(ok(details))
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusRequest {
    status: String,
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::WarehouseStaff, RoleName::Manager])?;
    let next = OrderStatus::parse(&request.status)?;
    let viewer = if user.is_manager() {
        None
    } else {
        Some(user.location()?)
    };

    let order = run_blocking(&state, move |store| {
        let order: Order = store.require(id)?;
        if viewer.is_some_and(|location| !order.involves(location)) {
            return Err(CoreError::Forbidden(
                "This order does not involve your location".to_string(),
            ));
        }
        orders::update_status(store, id, next)
    })
    .await?;
    info!(order_id = id, status = %order.status, by = %user.0.username, "order status changed");
    Ok(ok(order))
}

// =============================================================================
// SALES
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub(super) struct SalesQuery {
    garage_id: Option<u64>,
}

/// Staff act for their own garage; managers name one.
fn acting_garage(user: &CurrentUser, requested: Option<u64>) -> Result<u64, ApiError> {
    if user.is_manager() {
        return requested.ok_or_else(|| ApiError::bad_request("garage_id is required"));
    }
    let own = user.garage_id()?;
    match requested {
        Some(id) if id != own => Err(ApiError::forbidden()),
        _ => Ok(own),
    }
}

pub(super) async fn list_sales(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SalesQuery>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::LocalStaff, RoleName::Manager])?;
    let garage_id = acting_garage(&user, query.garage_id)?;
    let sales = run_blocking(&state, move |store| {
        sales::sales_by_garage(&store.snapshot()?, garage_id)
    })
    .await?;
    Ok(ok(sales))
}

#[derive(Debug, Deserialize)]
pub(super) struct SaleRequest {
    #[serde(default)]
    garage_id: Option<u64>,
    customer_id: u64,
    items: Vec<SaleLine>,
    #[serde(default)]
    payment_method: Option<String>,
}

pub(super) async fn record_sale(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<SaleRequest>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::LocalStaff, RoleName::Manager])?;
    let new = NewSale {
        garage_id: acting_garage(&user, request.garage_id)?,
        customer_id: request.customer_id,
        items: request.items,
        payment_method: request.payment_method,
    };
    let recorded = run_blocking(&state, move |store| sales::record_sale(store, &new)).await?;
    info!(
        sale_id = recorded.sale.sale_id,
        garage_id = recorded.sale.garage_id,
        total = %recorded.sale.total_amount,
        "sale recorded"
    );
    Ok(ok(recorded))
}

pub(super) async fn sale_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::LocalStaff, RoleName::Manager])?;
    let own_garage = if user.is_manager() {
        None
    } else {
        Some(user.garage_id()?)
    };
    let details = run_blocking(&state, move |store| {
        let snapshot = store.snapshot()?;
        let sale: Sale = snapshot.require(id)?;
        if own_garage.is_some_and(|garage| garage != sale.garage_id) {
            return Err(CoreError::Forbidden(
                "This sale belongs to another garage".to_string(),
            ));
        }
        sales::sale_details(&snapshot, id)
    })
    .await?;
    Ok(ok(details))
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentRequest {
    sale_id: u64,
    amount: Money,
    payment_method: String,
}

pub(super) async fn record_payment(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    let payment = run_blocking(&state, move |store| {
        sales::record_payment(store, request.sale_id, request.amount, &request.payment_method)
    })
    .await?;
    info!(payment_id = payment.payment_id, sale_id = payment.sale_id, "payment recorded");
    Ok(ok(payment))
}

// =============================================================================
// DIRECTORY
// =============================================================================

pub(super) async fn list_customers(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let customers = run_blocking(&state, |store| directory::list_customers(store)).await?;
    Ok(ok(customers))
}

pub(super) async fn create_customer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(new): Json<NewCustomer>,
) -> Result<Json<Value>, ApiError> {
    let customer =
        run_blocking(&state, move |store| directory::create_customer(store, &new)).await?;
    info!(customer_id = customer.customer_id, "customer created");
    Ok(ok(customer))
}

pub(super) async fn list_garages(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let garages = run_blocking(&state, |store| directory::list_garages(store)).await?;
    Ok(ok(garages))
}

pub(super) async fn list_warehouses(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let warehouses = run_blocking(&state, |store| directory::list_warehouses(store)).await?;
    Ok(ok(warehouses))
}
