//! # Reports
//!
//! National and local summaries for managers and garage staff.
//!
//! Every report reads from one [`RecordSource`], so passing a
//! [`Snapshot`](crate::storage::Snapshot) gives figures that agree with each
//! other even while sales are being recorded.

use crate::error::Result;
use crate::model::{Garage, Location, LocationType, Money, Product, Sale, SaleItem, Stock};
use crate::stock::{StockLine, stock_at};
use crate::storage::RecordSource;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Optional inclusive date range for sales reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl Period {
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let day = at.date();
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}

// =============================================================================
// NATIONAL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GarageSales {
    pub garage_id: u64,
    pub garage_name: String,
    pub total_sales: u64,
    pub total_revenue: Money,
    /// Revenue over sale count, rounded down to the penny.
    pub average_sale_value: Money,
}

/// Sales per garage, highest revenue first. Garages without sales in the
/// period are left out.
pub fn national_sales(source: &impl RecordSource, period: Period) -> Result<Vec<GarageSales>> {
    let mut totals: BTreeMap<u64, (u64, Money)> = BTreeMap::new();
    for sale in source.list::<Sale>()? {
        if period.contains(sale.sale_date) {
            let entry = totals.entry(sale.garage_id).or_insert((0, Money::ZERO));
            entry.0 += 1;
            entry.1 += sale.total_amount;
        }
    }

    let mut rows = Vec::with_capacity(totals.len());
    for (garage_id, (count, revenue)) in totals {
        rows.push(GarageSales {
            garage_id,
            garage_name: source
                .get::<Garage>(garage_id)?
                .map(|g| g.name)
                .unwrap_or_default(),
            total_sales: count,
            total_revenue: revenue,
            average_sale_value: revenue.divided_by(count),
        });
    }
    rows.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then(a.garage_name.cmp(&b.garage_name))
    });
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStock {
    pub product_id: u64,
    pub product_name: String,
    pub warehouse_stock: i64,
    pub garage_stock: i64,
    pub total_stock: i64,
}

/// Stock per product across the network, by product name. Products with
/// no stock rows are left out.
pub fn national_stock(source: &impl RecordSource) -> Result<Vec<ProductStock>> {
    let products: BTreeMap<u64, Product> = source
        .list::<Product>()?
        .into_iter()
        .map(|p| (p.product_id, p))
        .collect();

    let mut totals: BTreeMap<u64, (i64, i64)> = BTreeMap::new();
    for stock in source.list::<Stock>()? {
        let entry = totals.entry(stock.product_id).or_default();
        match stock.location.kind {
            LocationType::Warehouse => entry.0 = entry.0.saturating_add(stock.quantity),
            LocationType::Garage => entry.1 = entry.1.saturating_add(stock.quantity),
        }
    }

    let mut rows: Vec<ProductStock> = totals
        .into_iter()
        .filter_map(|(product_id, (warehouse, garage))| {
            products.get(&product_id).map(|p| ProductStock {
                product_id,
                product_name: p.name.clone(),
                warehouse_stock: warehouse,
                garage_stock: garage,
                total_stock: warehouse.saturating_add(garage),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
    Ok(rows)
}

// =============================================================================
// LOCAL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: u64,
    pub product_name: String,
    /// Number of sale lines for the product.
    pub times_sold: u64,
    pub total_quantity: i64,
    pub total_revenue: Money,
}

/// Per-product sales at one garage, highest revenue first.
pub fn local_sales(
    source: &impl RecordSource,
    garage_id: u64,
    period: Period,
) -> Result<Vec<ProductSales>> {
    let sale_ids: BTreeSet<u64> = source
        .list::<Sale>()?
        .into_iter()
        .filter(|s| s.garage_id == garage_id && period.contains(s.sale_date))
        .map(|s| s.sale_id)
        .collect();

    let mut totals: BTreeMap<u64, (u64, i64, Money)> = BTreeMap::new();
    for item in source.list::<SaleItem>()? {
        if sale_ids.contains(&item.sale_id) {
            let entry = totals
                .entry(item.product_id)
                .or_insert((0, 0, Money::ZERO));
            entry.0 += 1;
            entry.1 = entry.1.saturating_add(item.quantity);
            entry.2 += item.line_total();
        }
    }

    let mut rows = Vec::with_capacity(totals.len());
    for (product_id, (times, quantity, revenue)) in totals {
        rows.push(ProductSales {
            product_id,
            product_name: source
                .get::<Product>(product_id)?
                .map(|p| p.name)
                .unwrap_or_default(),
            times_sold: times,
            total_quantity: quantity,
            total_revenue: revenue,
        });
    }
    rows.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then(a.product_name.cmp(&b.product_name))
    });
    Ok(rows)
}

/// Stock at one location: lines needing reorder first, then by name.
pub fn local_stock(source: &impl RecordSource, location: Location) -> Result<Vec<StockLine>> {
    let mut lines = stock_at(source, location)?;
    lines.sort_by(|a, b| {
        b.needs_reorder
            .cmp(&a.needs_reorder)
            .then(a.product_name.cmp(&b.product_name))
    });
    Ok(lines)
}
