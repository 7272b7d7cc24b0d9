//! # Model
//!
//! Typed records for every stored table, plus the value types they use.
//!
//! Each record implements [`Record`]: it knows its table, its primary key,
//! how to decode itself from a CSV row and which rows it references. The
//! store uses the references to enforce foreign keys on every write.

mod kinds;
mod money;
mod records;

pub use kinds::{Location, LocationType, OrderStatus, RoleName};
pub use money::{Money, MoneyError};
pub use records::{
    Customer, Garage, Order, OrderItem, Payment, Product, Role, Sale, SaleItem, Stock, User,
    Warehouse,
};

use crate::csv_data::CsvRow;
use crate::error::Result;
use crate::schema::TableName;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A row of a stored table.
pub trait Record: Serialize + DeserializeOwned {
    /// The table this record lives in.
    const TABLE: TableName;

    /// Singular noun for messages ("product 4 not found").
    const ENTITY: &'static str;

    /// Primary key.
    fn id(&self) -> u64;

    /// Decode from a CSV row with the table's columns.
    fn from_row(row: &CsvRow) -> Result<Self>;

    /// Rows this record points at. Every one must exist when it is written.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A foreign-key value held by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub column: &'static str,
    pub table: TableName,
    pub id: u64,
}

impl Reference {
    #[must_use]
    pub const fn new(column: &'static str, table: TableName, id: u64) -> Self {
        Self { column, table, id }
    }

    /// Reference to a garage or warehouse through a location id column.
    #[must_use]
    pub const fn location(column: &'static str, location: Location) -> Self {
        Self::new(column, location.kind.table(), location.id)
    }
}
