//! Cell values and the coercion rules applied to raw CSV text.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// A single coerced CSV cell.
///
/// Decimal literals keep their text so that money columns can be parsed
/// exactly, without a floating-point round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(String),
    Text(String),
}

impl CellValue {
    /// Coerce one trimmed, unquoted cell.
    ///
    /// - empty → `Null`
    /// - `true` / `false` → `Bool`
    /// - integer literal → `Integer`
    /// - decimal literal → `Decimal`
    /// - anything else → `Text`
    ///
    /// Digit strings with a leading zero (`"0123"`) stay text: they are
    /// phone numbers and codes, not quantities.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Null;
        }
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        match classify_number(raw) {
            Some(NumberShape::Integer) => raw
                .parse::<i64>()
                .map(Self::Integer)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            Some(NumberShape::Decimal) => Self::Decimal(raw.to_string()),
            None => Self::Text(raw.to_string()),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text rendering of a non-null cell.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(Cow::Owned(b.to_string())),
            Self::Integer(n) => Some(Cow::Owned(n.to_string())),
            Self::Decimal(s) | Self::Text(s) => Some(Cow::Borrowed(s)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

enum NumberShape {
    Integer,
    Decimal,
}

fn classify_number(raw: &str) -> Option<NumberShape> {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if whole.len() > 1 && whole.starts_with('0') {
        return None;
    }

    match fraction {
        None => Some(NumberShape::Integer),
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            Some(NumberShape::Decimal)
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_scalars() {
        assert_eq!(CellValue::coerce(""), CellValue::Null);
        assert_eq!(CellValue::coerce("true"), CellValue::Bool(true));
        assert_eq!(CellValue::coerce("false"), CellValue::Bool(false));
        assert_eq!(CellValue::coerce("42"), CellValue::Integer(42));
        assert_eq!(CellValue::coerce("-7"), CellValue::Integer(-7));
        assert_eq!(CellValue::coerce("0"), CellValue::Integer(0));
        assert_eq!(
            CellValue::coerce("12.50"),
            CellValue::Decimal("12.50".to_string())
        );
    }

    #[test]
    fn keeps_codes_and_words_as_text() {
        assert_eq!(
            CellValue::coerce("01632960001"),
            CellValue::Text("01632960001".to_string())
        );
        assert_eq!(
            CellValue::coerce("Brake pads"),
            CellValue::Text("Brake pads".to_string())
        );
        assert_eq!(CellValue::coerce("1."), CellValue::Text("1.".to_string()));
        assert_eq!(CellValue::coerce("TRUE"), CellValue::Text("TRUE".to_string()));
    }

    #[test]
    fn oversized_integers_fall_back_to_text() {
        let raw = "99999999999999999999";
        assert_eq!(CellValue::coerce(raw), CellValue::Text(raw.to_string()));
    }

    #[test]
    fn serializes_untagged() {
        let cells = vec![
            CellValue::Null,
            CellValue::Bool(true),
            CellValue::Integer(3),
            CellValue::Decimal("1.25".to_string()),
        ];
        let json = serde_json::to_string(&cells).unwrap_or_default();
        assert_eq!(json, r#"[null,true,3,"1.25"]"#);
    }
}
