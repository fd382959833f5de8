//! Catalog and option files

use crate::{Schema, WeaveError, parse_type};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use sqlweave_diagnostics::SQW0402;
use sqlweave_semantic::ResolveOptions;
use std::fs;
use std::path::Path;

/// Parse a catalog document
///
/// The document maps table names to their columns, in order:
///
/// ```json
/// { "orders": { "id": "BIGINT", "price": "DECIMAL(10, 2)" } }
/// ```
pub fn parse_catalog(json: &str) -> crate::Result<Schema> {
    let tables: IndexMap<String, IndexMap<String, String>> = serde_json::from_str(json)
        .map_err(|err| WeaveError::system(SQW0402, format!("invalid catalog: {err}")))?;

    let mut catalog = Schema::empty();
    for (table, columns) in tables {
        let columns = columns
            .into_iter()
            .map(|(name, dtype)| Ok((name, parse_type(&dtype)?)))
            .collect::<crate::Result<Vec<_>>>()?;
        catalog = catalog.merge(&Schema::table(table, columns));
    }
    Ok(catalog)
}

pub fn load_catalog(path: &Path) -> Result<Schema> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    Ok(parse_catalog(&json)?)
}

/// Read [`ResolveOptions`]; missing keys keep their defaults
pub fn load_options(path: &Path) -> Result<ResolveOptions> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options: {}", path.display()))?;
    let options = serde_json::from_str(&json)
        .map_err(|err| WeaveError::system(SQW0402, format!("invalid options: {err}")))?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlweave_types::builder::{bigint, decimal};

    #[test]
    fn test_catalog_keeps_column_order() {
        let catalog = parse_catalog(
            r#"{"orders": {"price": "decimal(10,2)", "id": "bigint"}, "empty": {}}"#,
        )
        .unwrap();
        let orders = Schema::table("orders", [("price", decimal(10, 2).unwrap()), ("id", bigint())]);
        assert_eq!(catalog.fields, orders.fields);
        assert!(catalog.binds("empty"));
    }

    #[test]
    fn test_bad_type_in_catalog() {
        let err = parse_catalog(r#"{"t": {"c": "STRING"}}"#).unwrap_err();
        assert!(err.code().is_type_error());
    }

    #[test]
    fn test_malformed_catalog() {
        let err = parse_catalog(r#"{"t": ["BIGINT"]}"#).unwrap_err();
        assert_eq!(err.code(), SQW0402);
    }
}
