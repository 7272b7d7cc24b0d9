//! Dry-run check of one file: parse, validate and preview.

use super::cell::CellValue;
use super::parse::parse_csv;
use super::validate::validate_csv;
use serde::Serialize;
use serde_json::{Map, Value};

/// Rows included in [`CsvReport::sample_data`].
pub const SAMPLE_ROWS: usize = 5;

/// Outcome of [`check_csv`], shaped for JSON clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub row_count: usize,
    /// The first rows, columns in header order.
    pub sample_data: Vec<Map<String, Value>>,
}

fn cell_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Integer(n) => Value::from(*n),
        // decimals stay textual so amounts are never rounded
        CellValue::Decimal(s) | CellValue::Text(s) => Value::String(s.clone()),
    }
}

/// Parse and validate `content` as a file for `table_name` without writing.
#[must_use]
pub fn check_csv(table_name: &str, content: &str) -> CsvReport {
    let parsed = match parse_csv(content) {
        Ok(parsed) => parsed,
        Err(err) => {
            return CsvReport {
                success: false,
                errors: vec![err.to_string()],
                warnings: Vec::new(),
                row_count: 0,
                sample_data: Vec::new(),
            };
        }
    };

    let validation = validate_csv(table_name, &parsed);
    let sample_data = parsed
        .rows
        .iter()
        .take(SAMPLE_ROWS)
        .map(|row| {
            parsed
                .headers
                .iter()
                .map(|h| (h.clone(), row.get(h).map(cell_json).unwrap_or(Value::Null)))
                .collect()
        })
        .collect();

    CsvReport {
        success: validation.valid,
        errors: validation.errors,
        warnings: validation.warnings,
        row_count: parsed.rows.len(),
        sample_data,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_header_order_and_limits_rows() {
        let mut content = String::from(
            "product_id,name,description,price,discount_price,on_offer,reorder_level\n",
        );
        for id in 1..=7 {
            content.push_str(&format!("{id},Part {id},,9.99,,false,3\n"));
        }
        let report = check_csv("products", &content);

        assert!(report.success, "{:?}", report.errors);
        assert_eq!(report.row_count, 7);
        assert_eq!(report.sample_data.len(), SAMPLE_ROWS);
        let keys: Vec<&String> = report.sample_data[0].keys().collect();
        assert_eq!(keys[0], "product_id");
        assert_eq!(keys[6], "reorder_level");
        assert_eq!(report.sample_data[0]["price"], Value::String("9.99".to_string()));
        assert_eq!(report.sample_data[0]["on_offer"], Value::Bool(false));
    }

    #[test]
    fn parse_errors_become_report_errors() {
        let report = check_csv("products", "product_id");
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec!["CSV must contain at least a header row and one data row"]
        );
    }

    #[test]
    fn serializes_camel_case() {
        let report = check_csv("garages", "garage_id,name,address,phone,email\n1,A,,,\n");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rowCount"], 1);
        assert!(json.get("sampleData").is_some());
    }
}
