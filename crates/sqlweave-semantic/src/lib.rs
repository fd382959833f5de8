//! Column and relation resolution for sqlweave
//!
//! Trees built by `sqlweave-ast` start with every column reference typed
//! UNKNOWN. Resolution walks a relation tree, works out the schema each
//! relation produces, and rebuilds the tree with column references typed
//! from the schema in scope. Composite types are recomputed on the way up
//! by the node constructors.
//!
//! ```
//! use sqlweave_ast::{Relation, SelectQuery, Value};
//! use sqlweave_semantic::{Resolve, Schema};
//! use sqlweave_types::builder::bigint;
//!
//! let query = SelectQuery::new(vec![Value::field("id")])
//!     .unwrap()
//!     .from_relation(Relation::table("orders"));
//! let catalog = Schema::table("orders", [("id", bigint())]);
//!
//! let resolved = Relation::from(query).resolve(&catalog).unwrap();
//! assert_eq!(resolved.node.data_type(), bigint());
//! ```

mod error;
mod fields;
mod relation;
mod resolver;
mod schema;

pub use error::*;
pub use resolver::*;
pub use schema::*;
