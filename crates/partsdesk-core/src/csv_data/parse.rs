//! CSV parsing and typed per-row access.

use super::cell::CellValue;
use crate::error::{CoreError, Result};
use crate::model::Money;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// A parsed CSV file: header plus coerced data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    /// Header names, trimmed, in file order.
    pub headers: Vec<String>,
    /// Data rows whose width matches the header.
    pub rows: Vec<CsvRow>,
    /// 1-based file lines dropped because their width differed from the header.
    pub skipped_lines: Vec<usize>,
}

impl ParsedCsv {
    /// Whether the header names `column`.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// One data row, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    index: usize,
    cells: BTreeMap<String, CellValue>,
}

/// Parse CSV text.
///
/// The content is trimmed first; it must then hold a header line and at
/// least one data line. Cells are trimmed, unquoted and coerced with
/// [`CellValue::coerce`]. Rows with the wrong number of cells are skipped
/// and their line numbers recorded.
pub fn parse_csv(content: &str) -> Result<ParsedCsv> {
    let trimmed = content.trim().trim_start_matches('\u{feff}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(trimmed.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| CoreError::Parse(format!("Invalid CSV header: {e}")))?
            .iter()
            .map(|h| unquote(h).to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut parsed = ParsedCsv {
        headers,
        ..ParsedCsv::default()
    };
    let mut lines_seen = 0usize;

    for record in records {
        let record = record.map_err(|e| CoreError::Parse(format!("Invalid CSV: {e}")))?;
        lines_seen += 1;

        if record.len() != parsed.headers.len() {
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(lines_seen + 1);
            parsed.skipped_lines.push(line);
            continue;
        }

        let cells = parsed
            .headers
            .iter()
            .zip(record.iter())
            .map(|(header, raw)| (header.clone(), CellValue::coerce(unquote(raw))))
            .collect();
        parsed.rows.push(CsvRow {
            index: parsed.rows.len(),
            cells,
        });
    }

    if parsed.headers.is_empty() || lines_seen == 0 {
        return Err(CoreError::Parse(
            "CSV must contain at least a header row and one data row".to_string(),
        ));
    }

    Ok(parsed)
}

/// Trim, then drop one surrounding `"..."` pair. The reader only honours a
/// quote that opens the field, so `a, "b"` still carries its quotes here.
fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or(trimmed, str::trim)
}

// =============================================================================
// ROW ACCESSORS
// =============================================================================

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

static NULL_CELL: CellValue = CellValue::Null;

impl CsvRow {
    /// Build a row directly from cells (tests and API callers).
    #[must_use]
    pub fn from_cells<I, K>(index: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        Self {
            index,
            cells: cells.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Position among the data rows, from 0.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Spreadsheet row number: data index + 2 (1-based, after the header).
    #[must_use]
    pub fn row_number(&self) -> usize {
        self.index + 2
    }

    /// The cell under `column`, if the header has it.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    fn cell(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL_CELL)
    }

    /// A row-numbered error for this row.
    pub fn invalid(&self, message: impl Into<String>) -> CoreError {
        CoreError::Row {
            row: self.row_number(),
            message: message.into(),
        }
    }

    /// A required, non-negative integer key.
    pub fn id(&self, column: &str) -> Result<u64> {
        self.opt_id(column)?
            .ok_or_else(|| self.invalid(format!("{column} is required")))
    }

    pub fn opt_id(&self, column: &str) -> Result<Option<u64>> {
        match self.cell(column) {
            CellValue::Null => Ok(None),
            CellValue::Integer(n) if *n >= 0 => Ok(Some(*n as u64)),
            other => Err(self.invalid(format!(
                "{column} must be a non-negative integer, got {other}"
            ))),
        }
    }

    /// A required integer (quantities, levels).
    pub fn int(&self, column: &str) -> Result<i64> {
        self.opt_int(column)?
            .ok_or_else(|| self.invalid(format!("{column} is required")))
    }

    /// A required integer no smaller than `min`.
    pub fn int_at_least(&self, column: &str, min: i64) -> Result<i64> {
        let value = self.int(column)?;
        if value < min {
            return Err(self.invalid(format!("{column} must be at least {min}, got {value}")));
        }
        Ok(value)
    }

    pub fn opt_int(&self, column: &str) -> Result<Option<i64>> {
        match self.cell(column) {
            CellValue::Null => Ok(None),
            CellValue::Integer(n) => Ok(Some(*n)),
            other => Err(self.invalid(format!("{column} must be an integer, got {other}"))),
        }
    }

    /// Required text; numbers and booleans are rendered back to text.
    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)
            .ok_or_else(|| self.invalid(format!("{column} is required")))
    }

    #[must_use]
    pub fn opt_text(&self, column: &str) -> Option<String> {
        self.cell(column).as_text().map(|t| t.into_owned())
    }

    /// A required amount in pounds (`12`, `12.5`, `12.50`).
    pub fn money(&self, column: &str) -> Result<Money> {
        self.opt_money(column)?
            .ok_or_else(|| self.invalid(format!("{column} is required")))
    }

    pub fn opt_money(&self, column: &str) -> Result<Option<Money>> {
        match self.cell(column) {
            CellValue::Null => Ok(None),
            CellValue::Integer(n) => Money::from_pounds(*n)
                .map(Some)
                .ok_or_else(|| self.invalid(format!("{column} is out of range"))),
            CellValue::Decimal(s) | CellValue::Text(s) => Money::parse(s)
                .map(Some)
                .map_err(|e| self.invalid(format!("{column}: {e}"))),
            CellValue::Bool(_) => Err(self.invalid(format!("{column} must be an amount"))),
        }
    }

    /// A boolean flag; empty means `false`. Accepts `true`/`false` and `1`/`0`.
    pub fn flag(&self, column: &str) -> Result<bool> {
        match self.cell(column) {
            CellValue::Null | CellValue::Integer(0) | CellValue::Bool(false) => Ok(false),
            CellValue::Integer(1) | CellValue::Bool(true) => Ok(true),
            other => Err(self.invalid(format!("{column} must be true or false, got {other}"))),
        }
    }

    /// An optional timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare date.
    pub fn opt_timestamp(&self, column: &str) -> Result<Option<NaiveDateTime>> {
        let Some(text) = self.cell(column).as_text() else {
            return Ok(None);
        };
        parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| self.invalid(format!("{column} is not a valid date: {text}")))
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let parsed = parse_csv("id,name,price\n1,Brake pads,12.50\n2,\"Oil, 5W-30\",30\n").unwrap();
        assert_eq!(parsed.headers, vec!["id", "name", "price"]);
        assert_eq!(parsed.rows.len(), 2);

        let second = &parsed.rows[1];
        assert_eq!(second.get("id"), Some(&CellValue::Integer(2)));
        assert_eq!(
            second.get("name"),
            Some(&CellValue::Text("Oil, 5W-30".to_string()))
        );
        assert_eq!(second.row_number(), 3);
    }

    #[test]
    fn trims_cells_and_headers() {
        let parsed = parse_csv(" id , name \n 1 ,  Wipers  ").unwrap();
        assert_eq!(parsed.headers, vec!["id", "name"]);
        assert_eq!(
            parsed.rows[0].get("name"),
            Some(&CellValue::Text("Wipers".to_string()))
        );
    }

    #[test]
    fn strips_quotes_after_padding() {
        let parsed = parse_csv("id, \"name\"\n1, \"Filter\"\n2,\"\"\n").unwrap();
        assert_eq!(parsed.headers, vec!["id", "name"]);
        assert_eq!(
            parsed.rows[0].get("name"),
            Some(&CellValue::Text("Filter".to_string()))
        );
        assert!(parsed.has_column("name"));
    }

    #[test]
    fn padded_quoted_numbers_are_coerced() {
        let parsed = parse_csv("id,qty\n \"7\" , \"12\"\n").unwrap();
        assert_eq!(parsed.rows[0].get("id"), Some(&CellValue::Integer(7)));
        assert_eq!(parsed.rows[0].get("qty"), Some(&CellValue::Integer(12)));
    }

    #[test]
    fn accepts_crlf_and_bom() {
        let parsed = parse_csv("\u{feff}id,name\r\n1,Filter\r\n").unwrap();
        assert_eq!(parsed.headers, vec!["id", "name"]);
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn header_only_is_rejected() {
        let err = parse_csv("id,name\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV must contain at least a header row and one data row"
        );
        assert!(parse_csv("   ").is_err());
    }

    #[test]
    fn ragged_rows_are_skipped_with_line_numbers() {
        let parsed = parse_csv("id,name\n1,Filter\n2\n3,Belt,extra\n4,Bulb").unwrap();
        let ids: Vec<_> = parsed
            .rows
            .iter()
            .map(|r| r.get("id").cloned())
            .collect();
        assert_eq!(
            ids,
            vec![Some(CellValue::Integer(1)), Some(CellValue::Integer(4))]
        );
        assert_eq!(parsed.skipped_lines, vec![3, 4]);
        // data indexes stay dense after skipping
        assert_eq!(parsed.rows[1].index(), 1);
    }

    #[test]
    fn empty_cells_become_null() {
        let parsed = parse_csv("id,email\n1,").unwrap();
        assert_eq!(parsed.rows[0].get("email"), Some(&CellValue::Null));
    }

    #[test]
    fn accessors_report_row_numbers() {
        let row = CsvRow::from_cells(
            0,
            [
                ("id", CellValue::Text("abc".to_string())),
                ("qty", CellValue::Integer(3)),
            ],
        );
        let err = row.id("id").unwrap_err();
        assert!(err.to_string().starts_with("row 2: id must be a non-negative integer"));
        assert_eq!(row.int("qty").unwrap(), 3);
        assert!(row.int("missing").is_err());
        assert_eq!(row.opt_int("missing").unwrap(), None);
        assert_eq!(row.int_at_least("qty", 1).unwrap(), 3);
        let err = row.int_at_least("qty", 4).unwrap_err();
        assert_eq!(err.to_string(), "row 2: qty must be at least 4, got 3");
    }

    #[test]
    fn money_accessor_reads_pounds() {
        let row = CsvRow::from_cells(
            0,
            [
                ("whole", CellValue::Integer(12)),
                ("decimal", CellValue::Decimal("12.5".to_string())),
                ("bad", CellValue::Decimal("1.999".to_string())),
            ],
        );
        assert_eq!(row.money("whole").unwrap(), Money::from_pence(1200));
        assert_eq!(row.money("decimal").unwrap(), Money::from_pence(1250));
        assert!(row.money("bad").is_err());
        assert_eq!(row.opt_money("absent").unwrap(), None);
    }

    #[test]
    fn flag_accessor_defaults_to_false() {
        let row = CsvRow::from_cells(
            0,
            [
                ("yes", CellValue::Bool(true)),
                ("one", CellValue::Integer(1)),
                ("maybe", CellValue::Text("maybe".to_string())),
            ],
        );
        assert!(row.flag("yes").unwrap());
        assert!(row.flag("one").unwrap());
        assert!(!row.flag("absent").unwrap());
        assert!(row.flag("maybe").is_err());
    }

    #[test]
    fn timestamps_accept_common_shapes() {
        let row = CsvRow::from_cells(
            0,
            [
                ("a", CellValue::Text("2024-03-01 09:30:00".to_string())),
                ("b", CellValue::Text("2024-03-01T09:30:00Z".to_string())),
                ("c", CellValue::Text("2024-03-01".to_string())),
                ("d", CellValue::Text("March".to_string())),
            ],
        );
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0));
        assert_eq!(row.opt_timestamp("a").unwrap(), expected);
        assert_eq!(row.opt_timestamp("b").unwrap(), expected);
        assert_eq!(
            row.opt_timestamp("c").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(row.opt_timestamp("d").is_err());
        assert_eq!(row.opt_timestamp("absent").unwrap(), None);
    }
}
