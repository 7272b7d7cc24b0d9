//! One struct per stored table.

use super::kinds::{Location, LocationType, OrderStatus};
use super::money::Money;
use super::{Record, Reference};
use crate::csv_data::CsvRow;
use crate::error::Result;
use crate::schema::TableName;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Read a `(type, id)` column pair. Both empty means no location.
fn location(row: &CsvRow, type_column: &str, id_column: &str) -> Result<Option<Location>> {
    match (row.opt_text(type_column), row.opt_id(id_column)?) {
        (None, None) => Ok(None),
        (Some(kind), Some(id)) => {
            let kind = LocationType::parse(&kind).map_err(|e| row.invalid(e.to_string()))?;
            Ok(Some(Location { kind, id }))
        }
        _ => Err(row.invalid(format!(
            "{type_column} and {id_column} must both be set or both be empty"
        ))),
    }
}

fn required_location(row: &CsvRow, type_column: &str, id_column: &str) -> Result<Location> {
    location(row, type_column, id_column)?
        .ok_or_else(|| row.invalid(format!("{type_column} and {id_column} are required")))
}

// =============================================================================
// REFERENCE DATA
// =============================================================================

/// A staff role with its JSON permission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_id: u64,
    pub name: String,
    /// JSON array of permission names, as imported.
    pub permissions: String,
}

impl Record for Role {
    const TABLE: TableName = TableName::Roles;
    const ENTITY: &'static str = "role";

    fn id(&self) -> u64 {
        self.role_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            role_id: row.id("role_id")?,
            name: row.text("name")?,
            permissions: row.opt_text("permissions").unwrap_or_else(|| "[]".to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garage {
    pub garage_id: u64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Record for Garage {
    const TABLE: TableName = TableName::Garages;
    const ENTITY: &'static str = "garage";

    fn id(&self) -> u64 {
        self.garage_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            garage_id: row.id("garage_id")?,
            name: row.text("name")?,
            address: row.opt_text("address"),
            phone: row.opt_text("phone"),
            email: row.opt_text("email"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: u64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Record for Warehouse {
    const TABLE: TableName = TableName::Warehouses;
    const ENTITY: &'static str = "warehouse";

    fn id(&self) -> u64 {
        self.warehouse_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            warehouse_id: row.id("warehouse_id")?,
            name: row.text("name")?,
            address: row.opt_text("address"),
            phone: row.opt_text("phone"),
            email: row.opt_text("email"),
        })
    }
}

/// A catalogue part with its national price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount_price: Option<Money>,
    pub on_offer: bool,
    /// Stock below this level needs reordering.
    pub reorder_level: i64,
}

impl Product {
    /// The price a customer pays today.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        match self.discount_price {
            Some(discount) if self.on_offer => discount,
            _ => self.price,
        }
    }
}

impl Record for Product {
    const TABLE: TableName = TableName::Products;
    const ENTITY: &'static str = "product";

    fn id(&self) -> u64 {
        self.product_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            product_id: row.id("product_id")?,
            name: row.text("name")?,
            description: row.opt_text("description"),
            price: row.money("price")?,
            discount_price: row.opt_money("discount_price")?,
            on_offer: row.flag("on_offer")?,
            reorder_level: row.opt_int("reorder_level")?.unwrap_or(0),
        })
    }
}

/// A staff account. Managers usually have no location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    pub username: String,
    /// Hex SHA-256 of the password.
    pub password_hash: String,
    pub email: Option<String>,
    pub location: Option<Location>,
    pub role_id: u64,
}

impl Record for User {
    const TABLE: TableName = TableName::Users;
    const ENTITY: &'static str = "user";

    fn id(&self) -> u64 {
        self.user_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            user_id: row.id("user_id")?,
            username: row.text("username")?,
            password_hash: row.text("password_hash")?,
            email: row.opt_text("email"),
            location: location(row, "location_type", "location_id")?,
            role_id: row.id("role_id")?,
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::new("role_id", TableName::Roles, self.role_id)];
        if let Some(location) = self.location {
            refs.push(Reference::location("location_id", location));
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: u64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Record for Customer {
    const TABLE: TableName = TableName::Customers;
    const ENTITY: &'static str = "customer";

    fn id(&self) -> u64 {
        self.customer_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            customer_id: row.id("customer_id")?,
            name: row.text("name")?,
            address: row.opt_text("address"),
            phone: row.opt_text("phone"),
            email: row.opt_text("email"),
        })
    }
}

// =============================================================================
// STOCK
// =============================================================================

/// Quantity of one product held at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub stock_id: u64,
    pub product_id: u64,
    pub location: Location,
    pub quantity: i64,
}

impl Record for Stock {
    const TABLE: TableName = TableName::Stocks;
    const ENTITY: &'static str = "stock";

    fn id(&self) -> u64 {
        self.stock_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            stock_id: row.id("stock_id")?,
            product_id: row.id("product_id")?,
            location: required_location(row, "location_type", "location_id")?,
            quantity: match row.opt_int("quantity")? {
                Some(quantity) if quantity < 0 => {
                    return Err(row.invalid("quantity cannot be negative"));
                }
                quantity => quantity.unwrap_or(0),
            },
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("product_id", TableName::Products, self.product_id),
            Reference::location("location_id", self.location),
        ]
    }
}

// =============================================================================
// SALES
// =============================================================================

/// A completed sale at a garage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub sale_id: u64,
    pub garage_id: u64,
    pub customer_id: u64,
    pub total_amount: Money,
    pub sale_date: NaiveDateTime,
    pub status: String,
}

impl Record for Sale {
    const TABLE: TableName = TableName::Sales;
    const ENTITY: &'static str = "sale";

    fn id(&self) -> u64 {
        self.sale_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            sale_id: row.id("sale_id")?,
            garage_id: row.id("garage_id")?,
            customer_id: row.id("customer_id")?,
            total_amount: row.money("total_amount")?,
            sale_date: row.opt_timestamp("sale_date")?.unwrap_or_else(now),
            status: row
                .opt_text("status")
                .unwrap_or_else(|| "completed".to_string()),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("garage_id", TableName::Garages, self.garage_id),
            Reference::new("customer_id", TableName::Customers, self.customer_id),
        ]
    }
}

/// One line of a sale. `discount` is an absolute amount off the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub sale_item_id: u64,
    pub sale_id: u64,
    pub product_id: u64,
    pub quantity: i64,
    pub price: Money,
    pub discount: Money,
}

impl SaleItem {
    /// price × quantity − discount
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity) - self.discount
    }
}

impl Record for SaleItem {
    const TABLE: TableName = TableName::SaleItems;
    const ENTITY: &'static str = "sale item";

    fn id(&self) -> u64 {
        self.sale_item_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            sale_item_id: row.id("sale_item_id")?,
            sale_id: row.id("sale_id")?,
            product_id: row.id("product_id")?,
            quantity: row.int_at_least("quantity", 1)?,
            price: row.money("price")?,
            discount: row.opt_money("discount")?.unwrap_or(Money::ZERO),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("sale_id", TableName::Sales, self.sale_id),
            Reference::new("product_id", TableName::Products, self.product_id),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: u64,
    pub sale_id: u64,
    pub amount: Money,
    pub payment_method: String,
    pub payment_date: NaiveDateTime,
}

impl Record for Payment {
    const TABLE: TableName = TableName::Payments;
    const ENTITY: &'static str = "payment";

    fn id(&self) -> u64 {
        self.payment_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            payment_id: row.id("payment_id")?,
            sale_id: row.id("sale_id")?,
            amount: row.money("amount")?,
            payment_method: row.text("payment_method")?,
            payment_date: row.opt_timestamp("payment_date")?.unwrap_or_else(now),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new("sale_id", TableName::Sales, self.sale_id)]
    }
}

// =============================================================================
// ORDERS
// =============================================================================

/// A stock request from one location to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub from: Location,
    pub to: Location,
    pub status: OrderStatus,
    pub is_emergency: bool,
    pub order_date: NaiveDateTime,
}

impl Order {
    /// Whether `location` sends or receives this order.
    #[must_use]
    pub fn involves(&self, location: Location) -> bool {
        self.from == location || self.to == location
    }
}

impl Record for Order {
    const TABLE: TableName = TableName::Orders;
    const ENTITY: &'static str = "order";

    fn id(&self) -> u64 {
        self.order_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        let status = match row.opt_text("status") {
            Some(status) => OrderStatus::parse(&status).map_err(|e| row.invalid(e.to_string()))?,
            None => OrderStatus::Pending,
        };
        Ok(Self {
            order_id: row.id("order_id")?,
            from: required_location(row, "from_type", "from_id")?,
            to: required_location(row, "to_type", "to_id")?,
            status,
            is_emergency: row.flag("is_emergency")?,
            order_date: row.opt_timestamp("order_date")?.unwrap_or_else(now),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::location("from_id", self.from),
            Reference::location("to_id", self.to),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_item_id: u64,
    pub order_id: u64,
    pub product_id: u64,
    pub quantity: i64,
    pub price: Money,
}

impl Record for OrderItem {
    const TABLE: TableName = TableName::OrderItems;
    const ENTITY: &'static str = "order item";

    fn id(&self) -> u64 {
        self.order_item_id
    }

    fn from_row(row: &CsvRow) -> Result<Self> {
        Ok(Self {
            order_item_id: row.id("order_item_id")?,
            order_id: row.id("order_id")?,
            product_id: row.id("product_id")?,
            quantity: row.int_at_least("quantity", 1)?,
            price: row.money("price")?,
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("order_id", TableName::Orders, self.order_id),
            Reference::new("product_id", TableName::Products, self.product_id),
        ]
    }
}
