//! SQL type inference, coercion and column resolution
//!
//! This crate bundles the sqlweave workspace behind one dependency:
//! - Parameterized SQL data types and their coercion lattice ([`types`])
//! - Expression and relation trees that compute their own types ([`ast`])
//! - Column and relation resolution against a schema in scope ([`semantic`])
//! - Error codes and rendered diagnostics ([`diagnostics`])
//!
//! # Example
//!
//! ```
//! use sqlweave::prelude::*;
//!
//! let price = sqlweave::parse_type("DECIMAL(10, 2)")?;
//! let qty = sqlweave::parse_type("BIGINT")?;
//! assert_eq!(arithmetic_type(&price, &qty)?.to_string(), "DECIMAL(21,2)");
//!
//! let catalog = Schema::table("orders", [("price", price), ("qty", qty)]);
//! let total = Value::binary(BinaryOp::Multiply, Value::field("price"), Value::field("qty"))?;
//! let query = SelectQuery::new(vec![total.alias("total")?])?.from_relation(Relation::table("orders"));
//!
//! let resolved = Relation::from(query).resolve(&catalog)?;
//! assert_eq!(resolved.schema.to_string(), "total: DECIMAL(21,2) (<select>)\n");
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

pub use sqlweave_ast as ast;
pub use sqlweave_diagnostics as diagnostics;
pub use sqlweave_semantic as semantic;
pub use sqlweave_types as types;

// Convenience re-exports
pub use sqlweave_ast::{Relation, Value};
pub use sqlweave_diagnostics::{Diagnostic, Result, WeaveError};
pub use sqlweave_semantic::{Resolve, ResolveOptions, Resolved, Resolver, Schema, resolve_fields};
pub use sqlweave_types::DataType;

/// Parse a rendered type string, keeping the text for diagnostics
pub fn parse_type(input: &str) -> Result<DataType> {
    sqlweave_types::parse_data_type(input).map_err(|err| err.into_weave_error(input))
}

/// Parse and type a SQL literal such as `1.50`, `'abc'` or `DATE '2020-01-01'`
pub fn infer_literal(text: &str) -> Result<DataType> {
    Ok(sqlweave_types::infer_sql_literal(text)?)
}

/// Everything needed to build and resolve trees by hand
pub mod prelude {
    pub use sqlweave_ast::{
        BinaryOp, Function, JoinConfig, JoinType, Relation, SelectQuery, SetOperation,
        SetQuantifier, UnaryOp, Value,
    };
    pub use sqlweave_diagnostics::WeaveError;
    pub use sqlweave_semantic::{Resolve, ResolveOptions, Resolver, Schema, SchemaField, Source};
    pub use sqlweave_types::builder;
    pub use sqlweave_types::{
        DataType, TypeName, arithmetic_type, coalesce_type, common_supertype, concat_type,
        subtraction_type,
    };
}

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
