//! # CSV Data
//!
//! Reading bulk-import files: parsing into typed cells, per-row accessors
//! used by record decoding, and validation against the table catalogue.
//!
//! This module only handles format conversion. Writing rows is the job of
//! [`crate::import`].

mod cell;
mod parse;
mod report;
mod validate;

pub use cell::CellValue;
pub use parse::{CsvRow, ParsedCsv, parse_csv};
pub use report::{CsvReport, SAMPLE_ROWS, check_csv};
pub use validate::{Validation, validate_csv, validate_rows};
