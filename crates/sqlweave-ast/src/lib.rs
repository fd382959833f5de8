//! Expression and relation trees for sqlweave
//!
//! Nodes are built through constructors that compute each composite node's
//! type from its children. Column references start out UNKNOWN; the
//! `sqlweave-semantic` crate resolves them and rebuilds the tree through the
//! [`Resolvable`] capability defined here.

mod clause;
mod error;
mod expression;
mod function;
mod operator;
mod relation;
mod resolvable;

pub use clause::*;
pub use error::*;
pub use expression::*;
pub use function::*;
pub use operator::*;
pub use relation::*;
pub use resolvable::{ChildResolver, Resolvable};
