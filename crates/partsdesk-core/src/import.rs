//! # Bulk Import
//!
//! Loads `<table>.csv` files into the store.
//!
//! Files are imported in [`TableName::IMPORT_ORDER`] so parents land before
//! children. Each table is written in its own transaction: a table either
//! imports completely or leaves no rows behind. A failure on a critical
//! table (roles, garages, warehouses, products) stops the batch, since every
//! later table depends on it.

use crate::csv_data::{ParsedCsv, parse_csv, validate_rows};
use crate::error::{CoreError, Result};
use crate::model::{
    Customer, Garage, Order, OrderItem, Payment, Product, Record, Role, Sale, SaleItem, Stock,
    User, Warehouse,
};
use crate::schema::TableName;
use crate::storage::{Store, StoreTxn};
use serde::Serialize;
use std::collections::BTreeMap;

/// How rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Empty the table (and its dependents) before loading.
    pub truncate: bool,
    /// Replace rows whose primary key already exists. When `false`, such
    /// rows are skipped with a warning.
    pub update_existing: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            truncate: false,
            update_existing: true,
        }
    }
}

/// Outcome for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub table: String,
    pub success: bool,
    pub rows_imported: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ImportResult {
    fn failed(table: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            success: false,
            rows_imported: 0,
            error: Some(error.into()),
            warnings: None,
        }
    }

    fn imported(table: TableName, rows: u64, warnings: Vec<String>) -> Self {
        Self {
            table: table.as_str().to_string(),
            success: true,
            rows_imported: rows,
            error: None,
            warnings: (!warnings.is_empty()).then_some(warnings),
        }
    }
}

/// Outcome for a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Every result succeeded.
    pub success: bool,
    pub results: Vec<ImportResult>,
    pub total_rows_imported: u64,
}

impl ImportSummary {
    fn from_results(results: Vec<ImportResult>) -> Self {
        Self {
            success: results.iter().all(|r| r.success),
            total_rows_imported: results.iter().map(|r| r.rows_imported).sum(),
            results,
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Import a batch of files keyed by table name.
///
/// Tables run in import order. A file that fails to parse stops the batch,
/// as does any failure on a critical table; other failures are recorded and
/// the batch continues. Keys that name no table are reported as failed
/// results at the end and never imported.
pub fn import_files(
    store: &Store,
    files: &BTreeMap<String, String>,
    options: ImportOptions,
) -> ImportSummary {
    let mut results = Vec::new();

    for table in TableName::IMPORT_ORDER {
        let Some(content) = files.get(table.as_str()) else {
            continue;
        };
        let parsed = match parse_csv(content) {
            Ok(parsed) => parsed,
            Err(err) => {
                results.push(ImportResult::failed(table.as_str(), err.to_string()));
                break;
            }
        };
        let result = import_table(store, table, &parsed, options);
        let stop = !result.success && table.is_critical();
        results.push(result);
        if stop {
            break;
        }
    }

    for name in files.keys() {
        if TableName::parse(name).is_none() {
            results.push(ImportResult::failed(
                name.as_str(),
                format!("Unknown table: {name}"),
            ));
        }
    }

    ImportSummary::from_results(results)
}

/// Import one parsed file into `table` in a single transaction.
pub fn import_table(
    store: &Store,
    table: TableName,
    parsed: &ParsedCsv,
    options: ImportOptions,
) -> ImportResult {
    let validation = validate_rows(table, parsed);
    if !validation.valid {
        return ImportResult::failed(
            table.as_str(),
            format!("Validation failed: {}", validation.errors.join("; ")),
        );
    }

    let outcome = store.write(|txn| {
        if options.truncate {
            txn.truncate_cascade(table)?;
        }
        match table {
            TableName::Roles => load_rows::<Role>(txn, parsed, options),
            TableName::Garages => load_rows::<Garage>(txn, parsed, options),
            TableName::Warehouses => load_rows::<Warehouse>(txn, parsed, options),
            TableName::Products => load_rows::<Product>(txn, parsed, options),
            TableName::Users => load_rows::<User>(txn, parsed, options),
            TableName::Customers => load_rows::<Customer>(txn, parsed, options),
            TableName::Stocks => load_rows::<Stock>(txn, parsed, options),
            TableName::Sales => load_rows::<Sale>(txn, parsed, options),
            TableName::SaleItems => load_rows::<SaleItem>(txn, parsed, options),
            TableName::Payments => load_rows::<Payment>(txn, parsed, options),
            TableName::Orders => load_rows::<Order>(txn, parsed, options),
            TableName::OrderItems => load_rows::<OrderItem>(txn, parsed, options),
        }
    });

    match outcome {
        Ok(loaded) => {
            let mut warnings = validation.warnings;
            warnings.extend(loaded.warnings);
            ImportResult::imported(table, loaded.rows, warnings)
        }
        Err(err) => ImportResult::failed(table.as_str(), err.to_string()),
    }
}

/// The table a file name refers to: `dir/products.csv` → `products`.
#[must_use]
pub fn table_key(file_name: &str) -> &str {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    base.strip_suffix(".csv").unwrap_or(base)
}

struct Loaded {
    rows: u64,
    warnings: Vec<String>,
}

fn load_rows<R: Record>(
    txn: &StoreTxn,
    parsed: &ParsedCsv,
    options: ImportOptions,
) -> Result<Loaded> {
    let mut loaded = Loaded {
        rows: 0,
        warnings: Vec::new(),
    };

    for row in &parsed.rows {
        let record = R::from_row(row)?;
        let written = if options.update_existing {
            txn.upsert(&record).map(|_| true)
        } else if txn.exists(R::TABLE, record.id())? {
            loaded.warnings.push(format!(
                "Skipped row with existing primary key: {}",
                record.id()
            ));
            Ok(false)
        } else {
            txn.insert(&record).map(|()| true)
        };

        match written {
            Ok(true) => loaded.rows += 1,
            Ok(false) => {}
            Err(err @ CoreError::ForeignKey { .. }) => return Err(row.invalid(err.to_string())),
            Err(err) => return Err(err),
        }
    }

    Ok(loaded)
}
