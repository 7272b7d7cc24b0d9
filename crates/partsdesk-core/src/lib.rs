//! # PartsDesk Core
//!
//! Store, bulk-import pipeline and domain rules for a car-parts distribution
//! business: garages sell parts, warehouses supply them, managers oversee
//! both.
//!
//! ## Layout
//!
//! - [`schema`]: the twelve-table catalogue, import order and foreign keys
//! - [`csv_data`]: CSV parsing, cell coercion and schema validation
//! - [`import`]: referential-integrity-ordered, transactional bulk import
//! - [`storage`]: the redb-backed record store
//! - [`model`]: typed records and value types ([`Money`], [`Location`], ...)
//! - [`pricing`], [`sales`], [`orders`], [`stock`], [`directory`]: operations
//! - [`reports`]: national and local summaries
//! - [`auth`]: password hashing, signed session tokens, role checks
//!
//! The crate is synchronous and log-free. The binary (`apps/partsdesk`)
//! owns the runtime, the HTTP surface and tracing.

pub mod auth;
pub mod csv_data;
pub mod directory;
pub mod import;
pub mod model;
pub mod orders;
pub mod pricing;
pub mod reports;
pub mod sales;
pub mod schema;
pub mod stock;
pub mod storage;

mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{SessionSigner, SessionUser};
pub use error::{CoreError, Result};
pub use import::{ImportOptions, ImportResult, ImportSummary};
pub use model::{
    Customer, Garage, Location, LocationType, Money, Order, OrderItem, OrderStatus, Payment,
    Product, Record, Reference, Role, RoleName, Sale, SaleItem, Stock, User, Warehouse,
};
pub use schema::TableName;
pub use storage::{RecordSource, Store};
