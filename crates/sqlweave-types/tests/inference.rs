//! Literal inference tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;
use sqlweave_types::builder::{bigint, boolean, double, integer, unknown, varchar};
use sqlweave_types::inference::parse_literal;
use sqlweave_types::{
    LiteralValue, TypeError, TypeName, infer_sql_literal, infer_type, infer_typed_literal,
};
use std::str::FromStr;

#[rstest]
#[case(LiteralValue::Null, unknown())]
#[case(LiteralValue::Boolean(false), boolean())]
#[case(LiteralValue::Integer(2_147_483_647), integer())]
#[case(LiteralValue::Integer(-2_147_483_648), integer())]
#[case(LiteralValue::Integer(2_147_483_648), bigint())]
#[case(LiteralValue::Float(0.5), double())]
#[case(LiteralValue::from("héllo"), varchar(Some(5)))]
#[case(LiteralValue::from(""), varchar(Some(0)))]
fn test_infer_untyped(#[case] literal: LiteralValue, #[case] expected: sqlweave_types::DataType) {
    assert_eq!(infer_type(&literal).unwrap(), expected);
}

#[test]
fn test_infer_decimal_keeps_scale() {
    let value = Decimal::from_str("1.500").unwrap();
    assert_eq!(
        LiteralValue::Decimal(value).data_type().unwrap().to_string(),
        "DECIMAL(4,3)"
    );
}

#[rstest]
#[case(TypeName::Timestamp, "2021-01-01 10:00:00.123", "TIMESTAMP(3)")]
#[case(TypeName::Timestamp, "2021-01-01 10:00:00", "TIMESTAMP(0)")]
#[case(TypeName::Timestamp, "2021-01-01 10:00:00.5 America/New_York", "TIMESTAMP(1) WITH TIME ZONE")]
#[case(TypeName::Time, "10:00:00.123456", "TIME(6)")]
#[case(TypeName::Time, "10:00:00+02:00", "TIME(0) WITH TIME ZONE")]
#[case(TypeName::Decimal, "-12.25", "DECIMAL(4,2)")]
#[case(TypeName::Char, "abc", "CHAR(3)")]
#[case(TypeName::Date, "2021-01-01", "DATE")]
#[case(TypeName::Json, "{}", "JSON")]
fn test_infer_typed(#[case] name: TypeName, #[case] text: &str, #[case] expected: &str) {
    assert_eq!(infer_typed_literal(name, text).unwrap().to_string(), expected);
}

#[test]
fn test_typed_literal_needs_parameterless_or_inferable_type() {
    assert!(matches!(
        infer_typed_literal(TypeName::Array, "[1]"),
        Err(TypeError::MissingParameter { .. })
    ));
    assert!(matches!(
        infer_typed_literal(TypeName::Decimal, "abc"),
        Err(TypeError::InvalidLiteral { .. })
    ));
}

#[rstest]
#[case("NULL", "UNKNOWN")]
#[case("true", "BOOLEAN")]
#[case("42", "INTEGER")]
#[case("9999999999", "BIGINT")]
#[case("123456789012345678901234", "DECIMAL(24,0)")]
#[case("3.14", "DECIMAL(3,2)")]
#[case("1e3", "DOUBLE")]
#[case("'it''s'", "VARCHAR(4)")]
#[case("TIMESTAMP '2021-01-01 00:00:00.000'", "TIMESTAMP(3)")]
#[case("decimal '0.05'", "DECIMAL(2,2)")]
#[case("DOUBLE PRECISION '1'", "DOUBLE")]
fn test_infer_sql_literal(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(infer_sql_literal(text).unwrap().to_string(), expected);
}

#[test]
fn test_unparseable_literal() {
    assert!(matches!(
        parse_literal("12abc"),
        Err(TypeError::InvalidLiteral { .. })
    ));
    assert!(matches!(
        infer_sql_literal("WIDGET 'x'"),
        Err(TypeError::UnknownTypeName { .. })
    ));
}
