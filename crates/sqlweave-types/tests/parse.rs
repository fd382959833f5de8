//! Type-string parsing tests

mod common;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use sqlweave_diagnostics::Span;
use sqlweave_types::builder::{
    array, bigint, char, decimal, double, integer, interval_day_to_second, map, row, time,
    timestamp, varchar,
};
use sqlweave_types::{DataType, ParseTypeError, TypeError, parse_data_type};

#[rstest]
#[case("bigint", bigint())]
#[case("  Integer  ", integer())]
#[case("DOUBLE PRECISION", double())]
#[case("double   precision", double())]
#[case("DECIMAL", decimal(38, 0).unwrap())]
#[case("decimal(7, 2)", decimal(7, 2).unwrap())]
#[case("DECIMAL(4)", decimal(4, 0).unwrap())]
#[case("VARCHAR", varchar(None))]
#[case("varchar(12)", varchar(Some(12)))]
#[case("CHAR", char(None))]
#[case("TIMESTAMP", timestamp(None, false).unwrap())]
#[case("timestamp(3) with time zone", timestamp(Some(3), true).unwrap())]
#[case("TIME WITHOUT TIME ZONE", time(None, false).unwrap())]
#[case("interval day to second", interval_day_to_second())]
#[case("ARRAY(MAP(VARCHAR, ARRAY(INTEGER)))", array(map(varchar(None), array(integer()))))]
#[case("ROW(BIGINT, ROW(), DOUBLE)", row(vec![bigint(), row(vec![]), double()]))]
fn test_parse_valid(#[case] input: &str, #[case] expected: DataType) {
    assert_eq!(parse_data_type(input).unwrap(), expected);
}

#[rstest]
#[case("DECIMAL(39, 0)")]
#[case("TIMESTAMP(13)")]
#[case("INTERVAL MONTH TO DAY")]
#[case("ARRAY")]
#[case("BIGINT(3)")]
#[case("INTEGER WITH TIME ZONE")]
#[case("ROW(1, 2)")]
#[case("STRING")]
fn test_parse_invalid(#[case] input: &str) {
    assert!(matches!(
        parse_data_type(input),
        Err(ParseTypeError::Invalid { .. } | ParseTypeError::TooManyParameters { .. })
    ));
}

#[test]
fn test_out_of_range_points_at_node() {
    let err = parse_data_type("MAP(BIGINT, DECIMAL(40,2))").unwrap_err();
    assert_eq!(err.span(), Span::new(12, 25));
    match err {
        ParseTypeError::Invalid { source, .. } => assert!(matches!(
            source,
            TypeError::OutOfRange { value: 40, .. }
        )),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[rstest]
#[case("ARRAY(")]
#[case("DECIMAL(4,,2)")]
#[case("VARCHAR 3")]
#[case("")]
fn test_parse_syntax_errors(#[case] input: &str) {
    assert!(matches!(
        parse_data_type(input),
        Err(ParseTypeError::Syntax { .. })
    ));
}

proptest! {
    #[test]
    fn prop_render_then_parse_is_identity(dtype in common::any_type()) {
        let rendered = dtype.to_string();
        prop_assert_eq!(parse_data_type(&rendered).unwrap(), dtype);
    }

    #[test]
    fn prop_parse_ignores_case(dtype in common::any_type()) {
        let lowered = dtype.to_string().to_lowercase();
        prop_assert_eq!(parse_data_type(&lowered).unwrap(), dtype);
    }
}
