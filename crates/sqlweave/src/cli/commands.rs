//! Command implementations
//!
//! Each command returns the text to print so the binary stays a thin
//! argument-parsing layer.

use crate::cli::catalog::{load_catalog, load_options};
use crate::{Relation, Resolver, Result, Schema, Value, WeaveError, parse_type};
use anyhow::bail;
use log::debug;
use sqlweave_ast::{BinaryOp, JoinConfig, SelectQuery};
use sqlweave_semantic::ResolveOptions;
use sqlweave_types::{DataType, arithmetic_type, concat_type, subtraction_type, variadic_supertype};
use std::path::PathBuf;

fn parse_all(inputs: &[String]) -> Result<Vec<DataType>> {
    inputs.iter().map(|input| parse_type(input)).collect()
}

/// Parse, validate and normalize each type string, one per line
pub fn normalize(inputs: &[String]) -> Result<String> {
    let types = parse_all(inputs)?;
    Ok(types.iter().map(DataType::to_string).collect::<Vec<_>>().join("\n"))
}

/// Common supertype of all operands
pub fn coerce(inputs: &[String]) -> Result<String> {
    let types = parse_all(inputs)?;
    Ok(variadic_supertype(&types)?.to_string())
}

/// Result type of `CONCAT(...)` over the operands
pub fn concat(inputs: &[String]) -> Result<String> {
    let types = parse_all(inputs)?;
    Ok(concat_type(&types)?.to_string())
}

/// Result type of `left <op> right`
pub fn arith(op: &str, left: &str, right: &str) -> anyhow::Result<String> {
    let Some(op) = BinaryOp::arithmetic_from_symbol(op) else {
        bail!("unknown arithmetic operator '{op}', expected one of + - * / %");
    };
    let (left, right) = (parse_type(left)?, parse_type(right)?);
    let dtype = match op {
        BinaryOp::Minus => subtraction_type(&left, &right),
        _ => arithmetic_type(&left, &right),
    }
    .map_err(WeaveError::from)?;
    Ok(dtype.to_string())
}

/// Inferred type of a SQL literal
pub fn infer(literal: &str) -> Result<String> {
    Ok(crate::infer_literal(literal)?.to_string())
}

/// Arguments of the `select` command
#[derive(Debug, Clone, Default)]
pub struct SelectConfig {
    /// Catalog file declaring base tables
    pub catalog: Option<PathBuf>,
    /// Resolution options file
    pub options: Option<PathBuf>,
    /// Tables in the FROM clause, cross joined in order
    pub from: Vec<String>,
    /// Select list entries: `col`, `t.col`, `*` or `t.*`
    pub columns: Vec<String>,
    /// Refuse unresolved column references, overriding the options file
    pub strict: bool,
}

/// Resolve `SELECT columns FROM tables` and print the output schema
pub fn select(config: &SelectConfig) -> anyhow::Result<String> {
    let catalog = match &config.catalog {
        Some(path) => load_catalog(path)?,
        None => Schema::empty(),
    };
    let mut options = match &config.options {
        Some(path) => load_options(path)?,
        None => ResolveOptions::default(),
    };
    options.deny_unresolved |= config.strict;
    debug!("resolving with {options:?}");

    let schema = resolve_select(catalog, options, &config.from, &config.columns)?;
    Ok(schema.to_string().trim_end().to_string())
}

/// Build the query from its textual parts and resolve it
pub fn resolve_select(
    catalog: Schema,
    options: ResolveOptions,
    from: &[String],
    columns: &[String],
) -> Result<Schema> {
    let select = columns.iter().map(|column| column_value(column)).collect();
    let mut query = SelectQuery::new(select)?;
    if let Some(relation) = from_relation(from) {
        query = query.from_relation(relation);
    }

    let mut resolver = Resolver::new(options).with_catalog(catalog);
    let resolved = resolver.resolve_relation(&Relation::from(query))?;
    Ok(resolved.schema)
}

fn from_relation(tables: &[String]) -> Option<Relation> {
    tables
        .iter()
        .map(Relation::table)
        .reduce(|left, right| Relation::join(left, right, JoinConfig::cross()))
}

/// `*`, `t.*`, `t.col` or `col`
pub fn column_value(column: &str) -> Value {
    let column = column.trim();
    match column.rsplit_once('.') {
        _ if column == "*" => Value::star(),
        Some((table, "*")) => Value::star_of(table),
        Some((table, name)) => Value::qualified(table, name),
        None => Value::field(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::catalog::parse_catalog;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sqlweave_diagnostics::{SQW0100, SQW0202};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        let out = normalize(&args(&["double precision", "array( varchar(3) )"])).unwrap();
        assert_eq!(out, "DOUBLE\nARRAY(VARCHAR(3))");
    }

    #[rstest]
    #[case(&["INTEGER", "BIGINT"], "BIGINT")]
    #[case(&["DECIMAL(5,2)", "INTEGER", "DECIMAL(12,4)"], "DECIMAL(14,4)")]
    #[case(&["VARCHAR(3)", "CHAR(5)"], "CHAR(5)")]
    #[case(&[], "UNKNOWN")]
    fn test_coerce(#[case] inputs: &[&str], #[case] expected: &str) {
        assert_eq!(coerce(&args(inputs)).unwrap(), expected);
    }

    #[test]
    fn test_coerce_reports_incompatible_pair() {
        let err = coerce(&args(&["BOOLEAN", "DATE"])).unwrap_err();
        assert_eq!(err.code(), SQW0100);
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat(&args(&["VARCHAR(3)", "VARCHAR(4)"])).unwrap(), "VARCHAR(7)");
        assert_eq!(
            concat(&args(&["ARRAY(BIGINT)", "INTEGER"])).unwrap(),
            "ARRAY(BIGINT)"
        );
    }

    #[rstest]
    #[case("+", "INTEGER", "BIGINT", "BIGINT")]
    #[case("-", "DATE", "TIMESTAMP", "INTERVAL DAY TO SECOND")]
    #[case("*", "VARCHAR", "BIGINT", "UNKNOWN")]
    fn test_arith(#[case] op: &str, #[case] left: &str, #[case] right: &str, #[case] expected: &str) {
        assert_eq!(arith(op, left, right).unwrap(), expected);
    }

    #[test]
    fn test_arith_rejects_operator() {
        let err = arith("^", "INTEGER", "INTEGER").unwrap_err();
        assert!(err.to_string().contains("'^'"));
    }

    #[test]
    fn test_infer() {
        assert_eq!(infer("1.50").unwrap(), "DECIMAL(3,2)");
        assert_eq!(infer("'abc'").unwrap(), "VARCHAR(3)");
    }

    #[rstest]
    #[case("*", Value::star())]
    #[case("a.*", Value::star_of("a"))]
    #[case(" a.k ", Value::qualified("a", "k"))]
    #[case("k", Value::field("k"))]
    fn test_column_value(#[case] column: &str, #[case] expected: Value) {
        assert_eq!(column_value(column), expected);
    }

    fn catalog() -> Schema {
        parse_catalog(r#"{"a": {"k": "BIGINT", "x": "VARCHAR"}, "b": {"k": "INTEGER", "v": "DOUBLE"}}"#)
            .unwrap()
    }

    #[test]
    fn test_resolve_select_over_cross_join() {
        let schema = resolve_select(
            catalog(),
            ResolveOptions::default(),
            &args(&["a", "b"]),
            &args(&["b.k", "x", "v"]),
        )
        .unwrap();
        assert_eq!(
            schema.to_string(),
            "k: INTEGER (<select>)\nx: VARCHAR (<select>)\nv: DOUBLE (<select>)\n"
        );
    }

    #[test]
    fn test_resolve_select_strict() {
        let options = ResolveOptions {
            deny_unresolved: true,
            ..ResolveOptions::default()
        };
        let err = resolve_select(catalog(), options, &args(&["a"]), &args(&["k", "nope"])).unwrap_err();
        assert_eq!(err.code(), SQW0202);
    }
}
