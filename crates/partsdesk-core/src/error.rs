//! Error type shared by every core module.

use crate::model::OrderStatus;
use crate::schema::TableName;
use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced by the store and the domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The embedded database failed.
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    /// A stored record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// Input rejected by a domain rule. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// A CSV file could not be read at all.
    #[error("{0}")]
    Parse(String),

    /// A CSV data row could not be decoded into a record.
    #[error("row {row}: {message}")]
    Row { row: usize, message: String },

    /// A record looked up by primary key does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// A plain insert hit an existing primary key.
    #[error("duplicate key value ({column}={id}) in {table}")]
    DuplicateKey {
        table: TableName,
        column: &'static str,
        id: u64,
    },

    /// A write referenced a row that does not exist.
    #[error("foreign key violation: {table}.{column}={value} has no matching row in {parent}")]
    ForeignKey {
        table: TableName,
        column: &'static str,
        value: u64,
        parent: TableName,
    },

    /// The order lifecycle does not allow this change.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("invalid session token")]
    InvalidToken,

    #[error("session expired")]
    SessionExpired,

    /// The caller's role does not allow the action.
    #[error("{0}")]
    Forbidden(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

// redb splits its failures across one type per operation; fold them into
// the unified `redb::Error` so `?` works on every call.
macro_rules! storage_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CoreError {
                fn from(err: $ty) -> Self {
                    Self::Storage(err.into())
                }
            }
        )*
    };
}

storage_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
