//! Garage sales and payments.
//!
//! A sale is written in one transaction: the sale row, its line items and,
//! when a payment method is given, a payment for the full total. Lines are
//! priced at each product's effective price at the moment of sale.

use crate::directory::location_name;
use crate::error::{CoreError, Result};
use crate::model::{Customer, Garage, Location, Money, Payment, Product, Sale, SaleItem};
use crate::schema::TableName;
use crate::storage::{RecordSource, Store, StoreTxn};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const COMPLETED: &str = "completed";

/// One requested line of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SaleLine {
    pub product_id: u64,
    pub quantity: i64,
    /// Absolute amount off the line.
    #[serde(default)]
    pub discount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSale {
    pub garage_id: u64,
    pub customer_id: u64,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// What [`record_sale`] wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payment: Option<Payment>,
}

fn payment_method(method: &str) -> Result<String> {
    let method = method.trim();
    if method.is_empty() {
        return Err(CoreError::validation("Payment method is required"));
    }
    Ok(method.to_string())
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Record a sale at a garage.
pub fn record_sale(store: &Store, new: &NewSale) -> Result<RecordedSale> {
    if new.items.is_empty() {
        return Err(CoreError::validation("A sale needs at least one item"));
    }
    let method = new.payment_method.as_deref().map(payment_method).transpose()?;

    store.write(|txn| {
        txn.require::<Garage>(new.garage_id)?;
        txn.require::<Customer>(new.customer_id)?;

        let sale_id = txn.next_id(TableName::Sales)?;
        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            items.push(price_line(txn, sale_id, line)?);
        }
        let total: Money = items.iter().map(SaleItem::line_total).sum();

        let sale = Sale {
            sale_id,
            garage_id: new.garage_id,
            customer_id: new.customer_id,
            total_amount: total,
            sale_date: now(),
            status: COMPLETED.to_string(),
        };
        txn.insert(&sale)?;

        for item in &mut items {
            item.sale_item_id = txn.next_id(TableName::SaleItems)?;
            txn.insert(item)?;
        }

        let payment = match method {
            Some(method) => Some(insert_payment(txn, sale_id, total, method)?),
            None => None,
        };

        Ok(RecordedSale {
            sale,
            items,
            payment,
        })
    })
}

fn price_line(txn: &StoreTxn, sale_id: u64, line: &SaleLine) -> Result<SaleItem> {
    if line.quantity < 1 {
        return Err(CoreError::validation("Quantity must be at least 1"));
    }
    let product: Product = txn.require(line.product_id)?;
    let price = product.effective_price();
    if line.discount.is_negative() || line.discount > price.times(line.quantity) {
        return Err(CoreError::validation(format!(
            "Discount for {} must be between 0 and the line total",
            product.name
        )));
    }
    Ok(SaleItem {
        sale_item_id: 0,
        sale_id,
        product_id: product.product_id,
        quantity: line.quantity,
        price,
        discount: line.discount,
    })
}

fn insert_payment(txn: &StoreTxn, sale_id: u64, amount: Money, method: String) -> Result<Payment> {
    let payment = Payment {
        payment_id: txn.next_id(TableName::Payments)?,
        sale_id,
        amount,
        payment_method: method,
        payment_date: now(),
    };
    txn.insert(&payment)?;
    Ok(payment)
}

/// Take a payment against an existing sale.
pub fn record_payment(store: &Store, sale_id: u64, amount: Money, method: &str) -> Result<Payment> {
    if !amount.is_positive() {
        return Err(CoreError::validation("Payment amount must be greater than 0"));
    }
    let method = payment_method(method)?;
    store.write(|txn| {
        txn.require::<Sale>(sale_id)?;
        insert_payment(txn, sale_id, amount, method)
    })
}

// =============================================================================
// QUERIES
// =============================================================================

/// A sale row as listed for a garage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleSummary {
    pub sale_id: u64,
    pub garage_id: u64,
    pub customer_id: u64,
    pub customer_name: String,
    pub total_amount: Money,
    pub sale_date: NaiveDateTime,
    pub status: String,
}

/// Sales at `garage_id`, newest first.
pub fn sales_by_garage(source: &impl RecordSource, garage_id: u64) -> Result<Vec<SaleSummary>> {
    let customers: BTreeMap<u64, String> = source
        .list::<Customer>()?
        .into_iter()
        .map(|c| (c.customer_id, c.name))
        .collect();

    let mut sales: Vec<SaleSummary> = source
        .list::<Sale>()?
        .into_iter()
        .filter(|s| s.garage_id == garage_id)
        .map(|s| SaleSummary {
            customer_name: customers.get(&s.customer_id).cloned().unwrap_or_default(),
            sale_id: s.sale_id,
            garage_id: s.garage_id,
            customer_id: s.customer_id,
            total_amount: s.total_amount,
            sale_date: s.sale_date,
            status: s.status,
        })
        .collect();
    sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then(b.sale_id.cmp(&a.sale_id)));
    Ok(sales)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleItemView {
    pub sale_item_id: u64,
    pub product_id: u64,
    pub product_name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Money,
    pub discount: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub garage_name: String,
    pub customer_name: String,
    pub items: Vec<SaleItemView>,
    pub payments: Vec<Payment>,
    pub amount_paid: Money,
}

/// One sale with its lines and payments.
pub fn sale_details(source: &impl RecordSource, sale_id: u64) -> Result<SaleDetails> {
    let sale: Sale = source.require(sale_id)?;
    let products: BTreeMap<u64, Product> = source
        .list::<Product>()?
        .into_iter()
        .map(|p| (p.product_id, p))
        .collect();

    let items = source
        .list::<SaleItem>()?
        .into_iter()
        .filter(|item| item.sale_id == sale_id)
        .map(|item| {
            let product = products.get(&item.product_id);
            SaleItemView {
                sale_item_id: item.sale_item_id,
                product_id: item.product_id,
                product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                description: product.and_then(|p| p.description.clone()),
                quantity: item.quantity,
                price: item.price,
                discount: item.discount,
                line_total: item.line_total(),
            }
        })
        .collect();

    let payments: Vec<Payment> = source
        .list::<Payment>()?
        .into_iter()
        .filter(|p| p.sale_id == sale_id)
        .collect();
    let amount_paid = payments.iter().map(|p| p.amount).sum();

    Ok(SaleDetails {
        garage_name: location_name(source, Location::garage(sale.garage_id))?.unwrap_or_default(),
        customer_name: source
            .get::<Customer>(sale.customer_id)?
            .map(|c| c.name)
            .unwrap_or_default(),
        sale,
        items,
        payments,
        amount_paid,
    })
}
