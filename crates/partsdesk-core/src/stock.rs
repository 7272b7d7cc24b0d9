//! Stock levels per location.

use crate::error::{CoreError, Result};
use crate::model::{Location, Money, Product, Stock};
use crate::storage::{RecordSource, Store};
use serde::Serialize;
use std::collections::BTreeMap;

/// A stock row joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLine {
    pub stock_id: u64,
    pub product_id: u64,
    pub product_name: String,
    pub quantity: i64,
    pub reorder_level: i64,
    pub price: Money,
    pub on_offer: bool,
    pub needs_reorder: bool,
}

impl StockLine {
    fn new(stock: &Stock, product: &Product) -> Self {
        Self {
            stock_id: stock.stock_id,
            product_id: product.product_id,
            product_name: product.name.clone(),
            quantity: stock.quantity,
            reorder_level: product.reorder_level,
            price: product.effective_price(),
            on_offer: product.on_offer,
            needs_reorder: stock.quantity < product.reorder_level,
        }
    }
}

/// Everything held at `location`, ordered by product name.
pub fn stock_at(source: &impl RecordSource, location: Location) -> Result<Vec<StockLine>> {
    let products: BTreeMap<u64, Product> = source
        .list::<Product>()?
        .into_iter()
        .map(|p| (p.product_id, p))
        .collect();

    let mut lines: Vec<StockLine> = source
        .list::<Stock>()?
        .iter()
        .filter(|s| s.location == location)
        .filter_map(|s| products.get(&s.product_id).map(|p| StockLine::new(s, p)))
        .collect();
    lines.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then(a.stock_id.cmp(&b.stock_id))
    });
    Ok(lines)
}

/// Lines at `location` whose quantity is under the product's reorder level.
pub fn below_reorder_level(
    source: &impl RecordSource,
    location: Location,
) -> Result<Vec<StockLine>> {
    let mut lines = stock_at(source, location)?;
    lines.retain(|line| line.needs_reorder);
    Ok(lines)
}

/// Set the quantity of one stock row.
///
/// With `scope`, the row must belong to that location.
pub fn set_quantity(
    store: &Store,
    stock_id: u64,
    quantity: i64,
    scope: Option<Location>,
) -> Result<Stock> {
    if quantity < 0 {
        return Err(CoreError::validation("Quantity cannot be negative"));
    }
    store.write(|txn| {
        txn.update::<Stock>(stock_id, |stock| {
            if scope.is_some_and(|location| location != stock.location) {
                return Err(CoreError::Forbidden(
                    "Stock belongs to another location".to_string(),
                ));
            }
            stock.quantity = quantity;
            Ok(())
        })
    })
}
