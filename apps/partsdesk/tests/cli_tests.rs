//! Integration tests for PartsDesk CLI commands.
//!
//! Uses tempfile for databases and the CSV files under `tests/fixtures/seed`.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use partsdesk::cli::{
    CliError, Report, ReportArgs, ReportKind, cmd_hash_password, cmd_import, cmd_init, cmd_report,
    cmd_validate, collect_csv_files, render_import, render_validation,
};
use partsdesk_core::auth::verify_password;
use partsdesk_core::{ImportOptions, Money, Product, RecordSource, Store};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn seed_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/seed")
}

/// A fresh database in `dir`, loaded with the seed fixtures.
fn seeded_db(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("parts.redb");
    cmd_init(&db_path, false).unwrap();
    let summary = cmd_import(&db_path, &[seed_dir()], ImportOptions::default()).unwrap();
    assert!(summary.success, "seed import failed: {:?}", summary.results);
    db_path
}

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("parts.redb");

    cmd_init(&db_path, false).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("parts.redb");
    cmd_init(&db_path, false).unwrap();

    let result = cmd_init(&db_path, false);
    assert!(matches!(result, Err(CliError::AlreadyExists(_))));
}

#[test]
fn test_init_force_recreates_empty_database() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    cmd_init(&db_path, true).unwrap();

    let store = Store::open(&db_path).unwrap();
    assert!(store.list::<Product>().unwrap().is_empty());
}

// =============================================================================
// IMPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_collect_reads_directory_by_table_name() {
    let files = collect_csv_files(&[seed_dir()]).unwrap();
    assert_eq!(files.len(), 12);
    assert!(files.contains_key("products"));
    assert!(files.contains_key("order_items"));
}

#[test]
fn test_collect_rejects_directory_without_csv() {
    let temp = create_temp_dir();
    std::fs::write(temp.path().join("notes.txt"), "nothing here").unwrap();

    let result = collect_csv_files(&[temp.path().to_path_buf()]);
    assert!(matches!(result, Err(CliError::NoCsvFiles(_))));
}

#[test]
fn test_import_seed_directory() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let store = Store::open(&db_path).unwrap();
    let brake_pads: Product = store.require(1).unwrap();
    assert_eq!(brake_pads.name, "Brake pads");
    assert_eq!(brake_pads.discount_price, Some(Money::from_pence(1999)));
}

#[test]
fn test_import_requires_existing_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("missing.redb");

    let result = cmd_import(&db_path, &[seed_dir()], ImportOptions::default());
    assert!(matches!(result, Err(CliError::MissingDatabase(_))));
}

#[test]
fn test_import_single_file_updates_existing_rows() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let file = write_csv(
        &temp,
        "products.csv",
        "product_id,name,description,price,discount_price,on_offer,reorder_level\n\
         3,Spark plug,Iridium,3.75,,false,20\n",
    );

    let summary = cmd_import(&db_path, &[file], ImportOptions::default()).unwrap();
    assert!(summary.success);
    assert_eq!(summary.total_rows_imported, 1);

    let store = Store::open(&db_path).unwrap();
    let plug: Product = store.require(3).unwrap();
    assert_eq!(plug.price, Money::from_pence(375));
}

#[test]
fn test_import_insert_only_keeps_existing_rows() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let file = write_csv(
        &temp,
        "products.csv",
        "product_id,name,description,price,discount_price,on_offer,reorder_level\n\
         3,Spark plug,Iridium,3.75,,false,20\n",
    );
    let options = ImportOptions {
        truncate: false,
        update_existing: false,
    };

    let summary = cmd_import(&db_path, &[file], options).unwrap();
    assert!(summary.success);
    assert!(summary.results[0].warnings.is_some());

    let store = Store::open(&db_path).unwrap();
    let plug: Product = store.require(3).unwrap();
    assert_eq!(plug.price, Money::from_pence(325));
}

#[test]
fn test_import_reports_missing_parent() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let file = write_csv(
        &temp,
        "stocks.csv",
        "stock_id,product_id,location_id,location_type,quantity\n\
         9,99,1,garage,4\n",
    );

    let summary = cmd_import(&db_path, &[file], ImportOptions::default()).unwrap();
    assert!(!summary.success);
    let error = summary.results[0].error.as_deref().unwrap();
    assert!(error.starts_with("row 2"), "unexpected error: {error}");

    let rendered = render_import(&summary);
    assert!(rendered.contains("FAIL  stocks"));
}

#[test]
fn test_import_unknown_table_is_reported() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let file = write_csv(&temp, "invoices.csv", "invoice_id\n1\n");

    let summary = cmd_import(&db_path, &[file], ImportOptions::default()).unwrap();
    assert!(!summary.success);
    assert_eq!(
        summary.results[0].error.as_deref(),
        Some("Unknown table: invoices")
    );
}

// =============================================================================
// VALIDATE COMMAND TESTS
// =============================================================================

#[test]
fn test_validate_seed_file() {
    let report = cmd_validate(&seed_dir().join("products.csv"), None).unwrap();
    assert!(report.success);
    assert_eq!(report.row_count, 3);
    assert_eq!(report.sample_data.len(), 3);
    assert!(render_validation(&report).starts_with("valid: 3 data rows"));
}

#[test]
fn test_validate_missing_columns_against_named_table() {
    let temp = create_temp_dir();
    let file = write_csv(&temp, "upload.csv", "garage_id,name\n1,Northside\n");

    let report = cmd_validate(&file, Some("garages")).unwrap();
    assert!(!report.success);
    assert_eq!(
        report.errors,
        vec!["Missing required columns: address, phone, email"]
    );
}

#[test]
fn test_validate_missing_file() {
    let temp = create_temp_dir();
    let result = cmd_validate(&temp.path().join("absent.csv"), None);
    assert!(matches!(result, Err(CliError::Io { .. })));
}

// =============================================================================
// REPORT COMMAND TESTS
// =============================================================================

#[test]
fn test_report_national_sales_ranks_by_revenue() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let report = cmd_report(&db_path, ReportKind::NationalSales, &ReportArgs::default()).unwrap();
    let Report::NationalSales(rows) = &report else {
        panic!("wrong report kind");
    };
    assert_eq!(rows[0].garage_name, "Northside Garage");
    assert_eq!(rows[0].total_revenue, Money::from_pence(5848));
    assert_eq!(rows[1].total_revenue, Money::from_pence(850));

    let json = report.to_json().unwrap();
    assert_eq!(json[0]["total_revenue"], "58.48");
}

#[test]
fn test_report_local_stock_lists_reorders_first() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let args = ReportArgs {
        location_type: Some("warehouse".to_string()),
        location_id: Some(1),
        ..ReportArgs::default()
    };

    let report = cmd_report(&db_path, ReportKind::LocalStock, &args).unwrap();
    let Report::LocalStock(lines) = &report else {
        panic!("wrong report kind");
    };
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].product_name, "Spark plug");
    assert!(lines[0].needs_reorder);
    assert!(report.render().contains("Spark plug"));
}

#[test]
fn test_report_local_sales_requires_garage() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let result = cmd_report(&db_path, ReportKind::LocalSales, &ReportArgs::default());
    assert!(matches!(result, Err(CliError::Usage(_))));
}

#[test]
fn test_report_local_sales_for_garage() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let args = ReportArgs {
        garage: Some(1),
        ..ReportArgs::default()
    };

    let Report::LocalSales(rows) = cmd_report(&db_path, ReportKind::LocalSales, &args).unwrap()
    else {
        panic!("wrong report kind");
    };
    let pads = rows.iter().find(|r| r.product_name == "Brake pads").unwrap();
    assert_eq!(pads.total_quantity, 2);
    assert_eq!(pads.total_revenue, Money::from_pence(4998));
}

// =============================================================================
// HASH-PASSWORD COMMAND TESTS
// =============================================================================

#[test]
fn test_hash_password_matches_seed_hash() {
    let hash = cmd_hash_password("password123");
    assert_eq!(
        hash,
        "ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f"
    );
    assert!(verify_password("password123", &hash));
}
