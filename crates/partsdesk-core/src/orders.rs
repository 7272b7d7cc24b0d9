//! Stock orders between locations.
//!
//! Garages order from warehouses (or from other garages). Warehouse staff
//! move an order through its lifecycle; see [`OrderStatus`] for the allowed
//! transitions.

use crate::directory::{location_name, require_location};
use crate::error::{CoreError, Result};
use crate::model::{Location, Money, Order, OrderItem, OrderStatus, Product};
use crate::schema::TableName;
use crate::storage::{RecordSource, Store};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: i64,
}

/// A stock request from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOrder {
    pub from: Location,
    pub to: Location,
    #[serde(default)]
    pub is_emergency: bool,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Which orders a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    /// Orders sent from or to this location.
    Involving(Location),
}

/// Place an order. Items are priced at the effective price; status starts
/// at pending.
pub fn place_order(store: &Store, new: &NewOrder) -> Result<PlacedOrder> {
    if new.from == new.to {
        return Err(CoreError::validation(
            "Source and destination locations must differ",
        ));
    }
    if new.items.is_empty() {
        return Err(CoreError::validation("An order needs at least one item"));
    }
    if new.items.iter().any(|line| line.quantity < 1) {
        return Err(CoreError::validation("Quantity must be at least 1"));
    }

    store.write(|txn| {
        require_location(txn, new.from)?;
        require_location(txn, new.to)?;

        let order = Order {
            order_id: txn.next_id(TableName::Orders)?,
            from: new.from,
            to: new.to,
            status: OrderStatus::Pending,
            is_emergency: new.is_emergency,
            order_date: Utc::now().naive_utc(),
        };
        txn.insert(&order)?;

        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            let product: Product = txn.require(line.product_id)?;
            let item = OrderItem {
                order_item_id: txn.next_id(TableName::OrderItems)?,
                order_id: order.order_id,
                product_id: product.product_id,
                quantity: line.quantity,
                price: product.effective_price(),
            };
            txn.insert(&item)?;
            items.push(item);
        }

        Ok(PlacedOrder { order, items })
    })
}

/// Move an order to `next`, if the lifecycle allows it.
pub fn update_status(store: &Store, order_id: u64, next: OrderStatus) -> Result<Order> {
    store.write(|txn| {
        txn.update::<Order>(order_id, |order| {
            if !order.status.can_transition_to(next) {
                return Err(CoreError::InvalidTransition {
                    from: order.status,
                    to: next,
                });
            }
            order.status = next;
            Ok(())
        })
    })
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id: u64,
    pub from: Location,
    pub from_name: String,
    pub to: Location,
    pub to_name: String,
    pub status: OrderStatus,
    pub is_emergency: bool,
    pub order_date: NaiveDateTime,
    pub item_count: usize,
    pub total: Money,
}

fn summarize(
    source: &impl RecordSource,
    order: Order,
    items: &[OrderItem],
) -> Result<OrderSummary> {
    Ok(OrderSummary {
        from_name: location_name(source, order.from)?.unwrap_or_default(),
        to_name: location_name(source, order.to)?.unwrap_or_default(),
        order_id: order.order_id,
        from: order.from,
        to: order.to,
        status: order.status,
        is_emergency: order.is_emergency,
        order_date: order.order_date,
        item_count: items.len(),
        total: items.iter().map(|i| i.price.times(i.quantity)).sum(),
    })
}

/// Orders visible in `scope`, newest first.
pub fn list_orders(source: &impl RecordSource, scope: OrderScope) -> Result<Vec<OrderSummary>> {
    let mut items_by_order: BTreeMap<u64, Vec<OrderItem>> = BTreeMap::new();
    for item in source.list::<OrderItem>()? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let mut orders = Vec::new();
    for order in source.list::<Order>()? {
        let visible = match scope {
            OrderScope::All => true,
            OrderScope::Involving(location) => order.involves(location),
        };
        if visible {
            let items = items_by_order
                .get(&order.order_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            orders.push(summarize(source, order, items)?);
        }
    }
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.order_id.cmp(&a.order_id)));
    Ok(orders)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemView {
    pub order_item_id: u64,
    pub product_id: u64,
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub items: Vec<OrderItemView>,
}

/// One order with its lines.
pub fn order_details(source: &impl RecordSource, order_id: u64) -> Result<OrderDetails> {
    let order: Order = source.require(order_id)?;
    let items: Vec<OrderItem> = source
        .list::<OrderItem>()?
        .into_iter()
        .filter(|i| i.order_id == order_id)
        .collect();

    let mut views = Vec::with_capacity(items.len());
    for item in &items {
        views.push(OrderItemView {
            order_item_id: item.order_item_id,
            product_id: item.product_id,
            product_name: source
                .get::<Product>(item.product_id)?
                .map(|p| p.name)
                .unwrap_or_default(),
            quantity: item.quantity,
            price: item.price,
            line_total: item.price.times(item.quantity),
        });
    }

    Ok(OrderDetails {
        summary: summarize(source, order, &items)?,
        items: views,
    })
}
