//! # Table Catalogue
//!
//! The twelve tables PartsDesk stores, their column lists, primary keys and
//! the foreign-key graph between them.
//!
//! [`TableName::IMPORT_ORDER`] lists parents before children so a bulk import
//! never writes a row whose referenced row has not been written yet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the stored tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Roles,
    Garages,
    Warehouses,
    Products,
    Users,
    Customers,
    Stocks,
    Sales,
    SaleItems,
    Payments,
    Orders,
    OrderItems,
}

impl TableName {
    /// Referential-integrity order: every table comes after the tables it
    /// references.
    pub const IMPORT_ORDER: [TableName; 12] = [
        TableName::Roles,
        TableName::Garages,
        TableName::Warehouses,
        TableName::Products,
        TableName::Users,
        TableName::Customers,
        TableName::Stocks,
        TableName::Sales,
        TableName::SaleItems,
        TableName::Payments,
        TableName::Orders,
        TableName::OrderItems,
    ];

    /// The table name as it appears in file names and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Garages => "garages",
            Self::Warehouses => "warehouses",
            Self::Products => "products",
            Self::Users => "users",
            Self::Customers => "customers",
            Self::Stocks => "stocks",
            Self::Sales => "sales",
            Self::SaleItems => "sale_items",
            Self::Payments => "payments",
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
        }
    }

    /// Look a table up by name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::IMPORT_ORDER
            .into_iter()
            .find(|table| table.as_str() == name)
    }

    /// Required columns, primary key first.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Roles => &["role_id", "name", "permissions"],
            Self::Garages => &["garage_id", "name", "address", "phone", "email"],
            Self::Warehouses => &["warehouse_id", "name", "address", "phone", "email"],
            Self::Products => &[
                "product_id",
                "name",
                "description",
                "price",
                "discount_price",
                "on_offer",
                "reorder_level",
            ],
            Self::Users => &[
                "user_id",
                "username",
                "password_hash",
                "email",
                "location_id",
                "location_type",
                "role_id",
            ],
            Self::Customers => &["customer_id", "name", "address", "phone", "email"],
            Self::Stocks => &[
                "stock_id",
                "product_id",
                "location_id",
                "location_type",
                "quantity",
            ],
            Self::Sales => &[
                "sale_id",
                "garage_id",
                "customer_id",
                "total_amount",
                "sale_date",
                "status",
            ],
            Self::SaleItems => &[
                "sale_item_id",
                "sale_id",
                "product_id",
                "quantity",
                "price",
                "discount",
            ],
            Self::Payments => &[
                "payment_id",
                "sale_id",
                "amount",
                "payment_method",
                "payment_date",
            ],
            Self::Orders => &[
                "order_id",
                "from_id",
                "from_type",
                "to_id",
                "to_type",
                "status",
                "is_emergency",
                "order_date",
            ],
            Self::OrderItems => &[
                "order_item_id",
                "order_id",
                "product_id",
                "quantity",
                "price",
            ],
        }
    }

    /// The integer primary-key column.
    #[must_use]
    pub const fn primary_key(self) -> &'static str {
        self.columns()[0]
    }

    /// Tables whose import failure aborts the rest of a bulk import.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(
            self,
            Self::Roles | Self::Garages | Self::Warehouses | Self::Products
        )
    }

    /// Tables this table's rows may reference.
    #[must_use]
    pub const fn parents(self) -> &'static [TableName] {
        match self {
            Self::Roles | Self::Garages | Self::Warehouses | Self::Products | Self::Customers => {
                &[]
            }
            Self::Users => &[Self::Roles, Self::Garages, Self::Warehouses],
            Self::Stocks => &[Self::Products, Self::Garages, Self::Warehouses],
            Self::Sales => &[Self::Garages, Self::Customers],
            Self::SaleItems => &[Self::Sales, Self::Products],
            Self::Payments => &[Self::Sales],
            Self::Orders => &[Self::Garages, Self::Warehouses],
            Self::OrderItems => &[Self::Orders, Self::Products],
        }
    }

    /// Tables that reference this one directly, in import order.
    #[must_use]
    pub fn dependents(self) -> Vec<TableName> {
        Self::IMPORT_ORDER
            .into_iter()
            .filter(|table| table.parents().contains(&self))
            .collect()
    }

    /// This table plus every table that transitively references it.
    ///
    /// Truncating a table truncates the whole closure, mirroring
    /// `TRUNCATE ... CASCADE`.
    #[must_use]
    pub fn cascade(self) -> Vec<TableName> {
        let mut closure = vec![self];
        let mut cursor = 0;
        while let Some(&table) = closure.get(cursor) {
            for dependent in table.dependents() {
                if !closure.contains(&dependent) {
                    closure.push(dependent);
                }
            }
            cursor += 1;
        }
        closure
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown table: {s}"))
    }
}
