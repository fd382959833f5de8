//! Literal type inference
//!
//! Infers the [`DataType`] of SQL literals:
//! - untyped scalars (`TRUE`, `42`, `1.50`, `'abc'`, `NULL`) via [`infer_type`]
//! - typed literals (`TIMESTAMP '2021-01-01 10:00:00.123'`, `CHAR 'ab'`) via
//!   [`infer_typed_literal`]

use crate::builder::{bigint, boolean, char, decimal, double, integer, time, timestamp, unknown, varchar};
use crate::data_type::{DataType, TypeError, TypeName, TypeResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An untyped literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Exact numeric; the scale of the literal text is preserved
    Decimal(Decimal),
    String(String),
}

impl LiteralValue {
    pub fn data_type(&self) -> TypeResult<DataType> {
        infer_type(self)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => write!(f, "NULL"),
            LiteralValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            LiteralValue::Integer(i) => write!(f, "{i}"),
            LiteralValue::Float(x) => write!(f, "{x:E}"),
            LiteralValue::Decimal(d) => write!(f, "{d}"),
            LiteralValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Float(value)
    }
}

impl From<Decimal> for LiteralValue {
    fn from(value: Decimal) -> Self {
        LiteralValue::Decimal(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

/// Infer the type of an untyped literal
pub fn infer_type(value: &LiteralValue) -> TypeResult<DataType> {
    Ok(match value {
        LiteralValue::Null => unknown(),
        LiteralValue::Boolean(_) => boolean(),
        LiteralValue::Integer(i) => infer_integral(*i),
        LiteralValue::Float(_) => double(),
        LiteralValue::Decimal(d) => return infer_decimal(d),
        LiteralValue::String(s) => varchar(Some(s.chars().count() as i64)),
    })
}

/// INTEGER when the value fits in 32 bits, BIGINT otherwise
pub fn infer_integral(value: i64) -> DataType {
    if i32::try_from(value).is_ok() {
        integer()
    } else {
        bigint()
    }
}

/// `DECIMAL(digits, scale)` of an exact numeric.
///
/// Precision counts the significant digits of the unscaled value, and is
/// never less than the scale: `0.05` is `DECIMAL(2,2)`.
pub fn infer_decimal(value: &Decimal) -> TypeResult<DataType> {
    let scale = i64::from(value.scale());
    let digits = value.mantissa().unsigned_abs().checked_ilog10().map_or(1, |d| d + 1);
    decimal(i64::from(digits).max(scale).max(1), scale)
}

/// Infer the type of a typed literal such as `TIMESTAMP '...'`.
///
/// TIME and TIMESTAMP take their precision from the fractional-second digits
/// of the text and a timezone when the text carries a zone. DECIMAL and CHAR
/// are sized from the text. Any other type name is the bare type.
pub fn infer_typed_literal(type_name: TypeName, text: &str) -> TypeResult<DataType> {
    match type_name {
        TypeName::Timestamp => {
            let (precision, zoned) = timelike_shape(text, 2);
            timestamp(Some(precision), zoned)
        }
        TypeName::Time => {
            let (precision, zoned) = timelike_shape(text, 1);
            time(Some(precision), zoned)
        }
        TypeName::Decimal => {
            let value = Decimal::from_str(text.trim()).map_err(|_| invalid_literal("DECIMAL", text))?;
            infer_decimal(&value)
        }
        TypeName::Char => Ok(char(Some(text.chars().count() as i64))),
        other => DataType::new(other, []),
    }
}

fn invalid_literal(kind: &str, literal: &str) -> TypeError {
    TypeError::InvalidLiteral {
        kind: kind.to_string(),
        literal: literal.to_string(),
    }
}

/// Fractional digits of the time part, and whether a zone follows it.
/// `time_token` is the index of the whitespace-separated token holding the time.
fn timelike_shape(text: &str, time_token: usize) -> (i64, bool) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some(time_part) = tokens.get(time_token - 1) else {
        return (0, false);
    };
    let fraction = time_part
        .split_once('.')
        .map(|(_, rest)| rest.chars().take_while(|c| c.is_ascii_digit()).count())
        .unwrap_or(0);
    // Offsets attach to the time part: 10:00:00.5+01:00
    let offset = time_part
        .char_indices()
        .any(|(i, c)| i > 0 && (c == '+' || c == '-'));
    (fraction as i64, offset || tokens.len() > time_token)
}

/// Parse and type a SQL literal as written in a query.
///
/// Accepts `NULL`, `TRUE`/`FALSE`, integers, exact numerics (`1.50`),
/// approximate numerics (`1e3`), quoted strings, and typed literals
/// (`DATE '2020-01-01'`).
pub fn infer_sql_literal(text: &str) -> TypeResult<DataType> {
    let text = text.trim();
    if let Some((prefix, quoted)) = split_typed_literal(text) {
        let type_name = match prefix.to_ascii_uppercase().as_str() {
            "DOUBLE PRECISION" => TypeName::Double,
            name => TypeName::from_str(name)?,
        };
        return infer_typed_literal(type_name, &quoted);
    }
    infer_type(&parse_literal(text)?)
}

/// Parse an untyped literal
pub fn parse_literal(text: &str) -> TypeResult<LiteralValue> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("NULL") {
        return Ok(LiteralValue::Null);
    }
    if text.eq_ignore_ascii_case("TRUE") {
        return Ok(LiteralValue::Boolean(true));
    }
    if text.eq_ignore_ascii_case("FALSE") {
        return Ok(LiteralValue::Boolean(false));
    }
    if let Some(s) = unquote(text) {
        return Ok(LiteralValue::String(s));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(LiteralValue::Integer(i));
    }
    if text.contains(['e', 'E']) {
        return text
            .parse::<f64>()
            .map(LiteralValue::Float)
            .map_err(|_| invalid_literal("DOUBLE", text));
    }
    // Integers beyond 64 bits are exact numerics too
    Decimal::from_str(text)
        .map(LiteralValue::Decimal)
        .map_err(|_| invalid_literal("SQL", text))
}

/// `'it''s'` to `it's`; `None` when the text is not a single quoted string
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // a lone quote inside means the text was several strings
            if chars.next_if_eq(&'\'').is_none() {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

fn split_typed_literal(text: &str) -> Option<(&str, String)> {
    let quote = text.find('\'')?;
    let prefix = text[..quote].trim();
    if prefix.is_empty() {
        return None;
    }
    Some((prefix, unquote(&text[quote..])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decimal_digits() {
        let d = |s: &str| infer_decimal(&Decimal::from_str(s).unwrap()).unwrap().to_string();
        assert_eq!(d("123.45"), "DECIMAL(5,2)");
        assert_eq!(d("0.05"), "DECIMAL(2,2)");
        assert_eq!(d("-7"), "DECIMAL(1,0)");
        assert_eq!(d("0"), "DECIMAL(1,0)");
    }

    #[test]
    fn test_timelike_shape() {
        assert_eq!(timelike_shape("2021-01-01 10:00:00.123", 2), (3, false));
        assert_eq!(timelike_shape("2021-01-01 10:00:00 UTC", 2), (0, true));
        assert_eq!(timelike_shape("10:00:00.5+01:00", 1), (1, true));
        assert_eq!(timelike_shape("", 1), (0, false));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'it''s'").as_deref(), Some("it's"));
        assert_eq!(unquote("'a' 'b'"), None);
        assert_eq!(unquote("abc"), None);
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(LiteralValue::from("it's").to_string(), "'it''s'");
        assert_eq!(LiteralValue::Null.to_string(), "NULL");
        assert_eq!(LiteralValue::from(true).to_string(), "TRUE");
    }
}
