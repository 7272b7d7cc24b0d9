//! # CLI Commands
//!
//! One `cmd_*` function per subcommand. Each returns its result instead of
//! printing, so `main` decides between text and JSON and the integration
//! tests can inspect the values directly.

use crate::api::{self, AppState};
use crate::config::{Config, ConfigError};
use chrono::NaiveDate;
use partsdesk_core::auth::hash_password;
use partsdesk_core::csv_data::{CsvReport, check_csv};
use partsdesk_core::import::{ImportOptions, ImportSummary, import_files, table_key};
use partsdesk_core::reports::{self, GarageSales, Period, ProductSales, ProductStock};
use partsdesk_core::stock::StockLine;
use partsdesk_core::{CoreError, Location, LocationType, SessionSigner, Store};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database {0} already exists (use --force to recreate it)")]
    AlreadyExists(PathBuf),

    #[error("database {0} does not exist (run `partsdesk init` first)")]
    MissingDatabase(PathBuf),

    #[error("no .csv files found in {0}")]
    NoCsvFiles(PathBuf),

    #[error("{0}")]
    Usage(String),

    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(std::io::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// =============================================================================
// INIT
// =============================================================================

/// Create an empty database with every table.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), CliError> {
    if db_path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(db_path.to_path_buf()));
        }
        warn!(path = %db_path.display(), "removing existing database");
        std::fs::remove_file(db_path).map_err(io_error(db_path))?;
    }
    Store::open(db_path)?;
    info!(path = %db_path.display(), "database created");
    Ok(())
}

/// Open an existing database.
pub fn open_store(db_path: &Path) -> Result<Store, CliError> {
    if !db_path.exists() {
        return Err(CliError::MissingDatabase(db_path.to_path_buf()));
    }
    Ok(Store::open(db_path)?)
}

// =============================================================================
// SERVE
// =============================================================================

/// Run the HTTP API until Ctrl-C. The database is created when missing.
pub async fn cmd_serve(config: &Config) -> Result<(), CliError> {
    config.validate()?;
    let secret = config.session_secret()?;
    let store = Store::open(&config.database)?;
    info!(
        database = %config.database.display(),
        session_ttl_secs = config.session_ttl_secs,
        "store opened"
    );
    let signer = SessionSigner::new(secret, config.session_ttl_secs);
    let state = AppState::new(store, signer, config);
    api::serve(state, config).await.map_err(CliError::Server)
}

// =============================================================================
// IMPORT
// =============================================================================

/// Read `<table>.csv` files. Directories contribute every `.csv` inside them.
pub fn collect_csv_files(inputs: &[PathBuf]) -> Result<BTreeMap<String, String>, CliError> {
    let mut files = BTreeMap::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = false;
            for entry in std::fs::read_dir(input).map_err(io_error(input))? {
                let path = entry.map_err(io_error(input))?.path();
                if path.extension().is_some_and(|ext| ext == "csv") {
                    add_file(&mut files, &path)?;
                    found = true;
                }
            }
            if !found {
                return Err(CliError::NoCsvFiles(input.clone()));
            }
        } else {
            add_file(&mut files, input)?;
        }
    }
    Ok(files)
}

fn add_file(files: &mut BTreeMap<String, String>, path: &Path) -> Result<(), CliError> {
    let content = std::fs::read_to_string(path).map_err(io_error(path))?;
    let key = table_key(&path.to_string_lossy()).to_string();
    debug!(path = %path.display(), table = %key, bytes = content.len(), "read import file");
    files.insert(key, content);
    Ok(())
}

/// Import files into the database at `db_path`.
pub fn cmd_import(
    db_path: &Path,
    inputs: &[PathBuf],
    options: ImportOptions,
) -> Result<ImportSummary, CliError> {
    let files = collect_csv_files(inputs)?;
    let store = open_store(db_path)?;
    info!(
        files = files.len(),
        truncate = options.truncate,
        update_existing = options.update_existing,
        "import started"
    );

    let summary = import_files(&store, &files, options);
    for result in &summary.results {
        if result.success {
            info!(table = %result.table, rows = result.rows_imported, "table imported");
        } else {
            warn!(
                table = %result.table,
                error = result.error.as_deref().unwrap_or_default(),
                "table import failed"
            );
        }
    }
    Ok(summary)
}

pub fn render_import(summary: &ImportSummary) -> String {
    let mut out = String::new();
    for result in &summary.results {
        if result.success {
            let _ = writeln!(out, "ok    {:<12} {:>6} rows", result.table, result.rows_imported);
        } else {
            let _ = writeln!(
                out,
                "FAIL  {:<12} {}",
                result.table,
                result.error.as_deref().unwrap_or_default()
            );
        }
        for warning in result.warnings.iter().flatten() {
            let _ = writeln!(out, "      warning: {warning}");
        }
    }
    let _ = writeln!(out, "{} rows imported", summary.total_rows_imported);
    out
}

// =============================================================================
// VALIDATE
// =============================================================================

/// Check one file without touching a database. The table defaults to the
/// file name (`products.csv` → `products`).
pub fn cmd_validate(file: &Path, table: Option<&str>) -> Result<CsvReport, CliError> {
    let content = std::fs::read_to_string(file).map_err(io_error(file))?;
    let file_name = file.to_string_lossy();
    let table = table.unwrap_or_else(|| table_key(&file_name));
    Ok(check_csv(table, &content))
}

pub fn render_validation(report: &CsvReport) -> String {
    let mut out = String::new();
    let verdict = if report.success { "valid" } else { "invalid" };
    let _ = writeln!(out, "{verdict}: {} data rows", report.row_count);
    for error in &report.errors {
        let _ = writeln!(out, "error: {error}");
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

// =============================================================================
// REPORT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportKind {
    NationalSales,
    NationalStock,
    LocalSales,
    LocalStock,
}

/// Report selectors from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    pub garage: Option<u64>,
    pub location_type: Option<String>,
    pub location_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportArgs {
    fn period(&self) -> Period {
        Period {
            from: self.from,
            to: self.to,
        }
    }

    fn location(&self) -> Result<Location, CliError> {
        match (self.location_type.as_deref(), self.location_id) {
            (Some(kind), Some(id)) => Ok(Location {
                kind: LocationType::parse(kind)?,
                id,
            }),
            _ => Err(CliError::Usage(
                "--location-type and --location-id are required".to_string(),
            )),
        }
    }
}

/// A computed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    NationalSales(Vec<GarageSales>),
    NationalStock(Vec<ProductStock>),
    LocalSales(Vec<ProductSales>),
    LocalStock(Vec<StockLine>),
}

impl Report {
    pub fn to_json(&self) -> Result<Value, CliError> {
        Ok(match self {
            Self::NationalSales(rows) => serde_json::to_value(rows)?,
            Self::NationalStock(rows) => serde_json::to_value(rows)?,
            Self::LocalSales(rows) => serde_json::to_value(rows)?,
            Self::LocalStock(rows) => serde_json::to_value(rows)?,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::NationalSales(rows) => {
                let _ = writeln!(
                    out,
                    "{:<24} {:>6} {:>12} {:>10}",
                    "garage", "sales", "revenue", "average"
                );
                for r in rows {
                    let _ = writeln!(
                        out,
                        "{:<24} {:>6} {:>12} {:>10}",
                        r.garage_name,
                        r.total_sales,
                        r.total_revenue.to_string(),
                        r.average_sale_value.to_string()
                    );
                }
            }
            Self::NationalStock(rows) => {
                let _ = writeln!(
                    out,
                    "{:<24} {:>10} {:>8} {:>8}",
                    "product", "warehouse", "garage", "total"
                );
                for r in rows {
                    let _ = writeln!(
                        out,
                        "{:<24} {:>10} {:>8} {:>8}",
                        r.product_name, r.warehouse_stock, r.garage_stock, r.total_stock
                    );
                }
            }
            Self::LocalSales(rows) => {
                let _ = writeln!(
                    out,
                    "{:<24} {:>6} {:>8} {:>12}",
                    "product", "lines", "qty", "revenue"
                );
                for r in rows {
                    let _ = writeln!(
                        out,
                        "{:<24} {:>6} {:>8} {:>12}",
                        r.product_name,
                        r.times_sold,
                        r.total_quantity,
                        r.total_revenue.to_string()
                    );
                }
            }
            Self::LocalStock(rows) => {
                let _ = writeln!(out, "{:<24} {:>8} {:>8}  reorder", "product", "qty", "level");
                for r in rows {
                    let flag = if r.needs_reorder { "yes" } else { "" };
                    let _ = writeln!(
                        out,
                        "{:<24} {:>8} {:>8}  {flag}",
                        r.product_name, r.quantity, r.reorder_level
                    );
                }
            }
        }
        out
    }
}

pub fn cmd_report(db_path: &Path, kind: ReportKind, args: &ReportArgs) -> Result<Report, CliError> {
    let store = open_store(db_path)?;
    let snapshot = store.snapshot()?;
    let report = match kind {
        ReportKind::NationalSales => {
            Report::NationalSales(reports::national_sales(&snapshot, args.period())?)
        }
        ReportKind::NationalStock => Report::NationalStock(reports::national_stock(&snapshot)?),
        ReportKind::LocalSales => {
            let garage = args
                .garage
                .ok_or_else(|| CliError::Usage("--garage is required".to_string()))?;
            Report::LocalSales(reports::local_sales(&snapshot, garage, args.period())?)
        }
        ReportKind::LocalStock => {
            Report::LocalStock(reports::local_stock(&snapshot, args.location()?)?)
        }
    };
    Ok(report)
}

// =============================================================================
// HASH-PASSWORD
// =============================================================================

/// The `password_hash` column value for `password`.
pub fn cmd_hash_password(password: &str) -> String {
    hash_password(password)
}
