use super::{ApiError, AppState, CurrentUser, LocationQuery, ok, run_blocking};
use axum::Json;
use axum::extract::{Query, State};
use chrono::NaiveDate;
use partsdesk_core::RoleName;
use partsdesk_core::reports::{self, Period};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(super) struct SalesReportQuery {
    garage_id: Option<u64>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl SalesReportQuery {
    fn period(&self) -> Period {
        Period {
            from: self.from,
            to: self.to,
        }
    }
}

pub(super) async fn national_sales(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SalesReportQuery>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::Manager])?;
    let period = query.period();
    let rows = run_blocking(&state, move |store| {
        reports::national_sales(&store.snapshot()?, period)
    })
    .await?;
    Ok(ok(rows))
}

pub(super) async fn national_stock(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::Manager])?;
    let rows = run_blocking(&state, |store| reports::national_stock(&store.snapshot()?)).await?;
    Ok(ok(rows))
}

pub(super) async fn local_sales(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SalesReportQuery>,
) -> Result<Json<Value>, ApiError> {
    user.require(&[RoleName::LocalStaff, RoleName::Manager])?;
    let garage_id = if user.is_manager() {
        query
            .garage_id
            .ok_or_else(|| ApiError::bad_request("garage_id is required"))?
    } else {
        user.garage_id()?
    };
    let period = query.period();
    let rows = run_blocking(&state, move |store| {
        reports::local_sales(&store.snapshot()?, garage_id, period)
    })
    .await?;
    Ok(ok(rows))
}

pub(super) async fn local_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ApiError> {
    let location = query.resolve(&user)?;
    let rows = run_blocking(&state, move |store| {
        reports::local_stock(&store.snapshot()?, location)
    })
    .await?;
    Ok(ok(rows))
}
