//! Validation of parsed CSV data against the table catalogue.

use super::cell::CellValue;
use super::parse::ParsedCsv;
use crate::schema::TableName;
use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of validating one file for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    fn finish(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Validate parsed data for a table given by name.
///
/// Unknown names fail with `Unknown table: {name}`.
#[must_use]
pub fn validate_csv(table_name: &str, parsed: &ParsedCsv) -> Validation {
    match TableName::parse(table_name) {
        Some(table) => validate_rows(table, parsed),
        None => Validation::finish(vec![format!("Unknown table: {table_name}")], Vec::new()),
    }
}

/// Validate parsed data for a known table.
///
/// Checks, in order: at least one data row, every schema column present in
/// the header, and primary keys that are integers and unique. Duplicate and
/// invalid keys are reported with their spreadsheet row number.
#[must_use]
pub fn validate_rows(table: TableName, parsed: &ParsedCsv) -> Validation {
    let warnings: Vec<String> = parsed
        .skipped_lines
        .iter()
        .map(|line| format!("Skipped malformed line {line}"))
        .collect();

    if parsed.rows.is_empty() {
        return Validation::finish(vec!["CSV file contains no data rows".to_string()], warnings);
    }

    let mut errors = Vec::new();

    let missing: Vec<&str> = table
        .columns()
        .iter()
        .copied()
        .filter(|column| !parsed.has_column(column))
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing required columns: {}", missing.join(", ")));
    }

    let pk = table.primary_key();
    let mut seen = BTreeSet::new();
    for row in &parsed.rows {
        match row.get(pk) {
            Some(CellValue::Integer(value)) if *value >= 0 => {
                if !seen.insert(*value) {
                    errors.push(format!(
                        "Duplicate primary key ({pk}={value}) at row {}",
                        row.row_number()
                    ));
                }
            }
            // a missing pk column is already reported above
            None => {}
            Some(_) => {
                errors.push(format!(
                    "Invalid primary key ({pk}) at row {}",
                    row.row_number()
                ));
            }
        }
    }

    Validation::finish(errors, warnings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::csv_data::parse_csv;

    const GARAGES: &str = "garage_id,name,address,phone,email\n\
        1,Northside,1 High St,01632960001,north@example.com\n\
        2,Southside,2 Low Rd,01632960002,south@example.com\n";

    #[test]
    fn valid_file_passes() {
        let parsed = parse_csv(GARAGES).unwrap();
        let validation = validate_csv("garages", &parsed);
        assert!(validation.valid, "{:?}", validation.errors);
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn unknown_table_fails() {
        let parsed = parse_csv(GARAGES).unwrap();
        let validation = validate_csv("parts", &parsed);
        assert!(!validation.valid);
        assert_eq!(validation.errors, vec!["Unknown table: parts"]);
    }

    #[test]
    fn reports_missing_columns_together() {
        let parsed = parse_csv("garage_id,name\n1,Northside").unwrap();
        let validation = validate_rows(TableName::Garages, &parsed);
        assert_eq!(
            validation.errors,
            vec!["Missing required columns: address, phone, email"]
        );
    }

    #[test]
    fn reports_duplicate_keys_with_spreadsheet_rows() {
        let parsed = parse_csv(
            "garage_id,name,address,phone,email\n1,A,,,\n2,B,,,\n1,C,,,\n",
        )
        .unwrap();
        let validation = validate_rows(TableName::Garages, &parsed);
        assert!(!validation.valid);
        assert_eq!(
            validation.errors,
            vec!["Duplicate primary key (garage_id=1) at row 4"]
        );
    }

    #[test]
    fn rejects_null_and_text_keys() {
        let parsed =
            parse_csv("garage_id,name,address,phone,email\n,A,,,\nabc,B,,,\n").unwrap();
        let validation = validate_rows(TableName::Garages, &parsed);
        assert_eq!(
            validation.errors,
            vec![
                "Invalid primary key (garage_id) at row 2",
                "Invalid primary key (garage_id) at row 3"
            ]
        );
    }

    #[test]
    fn all_rows_malformed_means_no_data() {
        let parsed = parse_csv("garage_id,name,address,phone,email\n1,A\n").unwrap();
        let validation = validate_rows(TableName::Garages, &parsed);
        assert_eq!(validation.errors, vec!["CSV file contains no data rows"]);
        assert_eq!(validation.warnings, vec!["Skipped malformed line 2"]);
    }

    #[test]
    fn extra_columns_are_allowed() {
        let parsed = parse_csv(
            "garage_id,name,address,phone,email,notes\n1,A,,,,open late\n",
        )
        .unwrap();
        assert!(validate_rows(TableName::Garages, &parsed).valid);
    }
}
