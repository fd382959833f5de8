//! Resolution errors

use sqlweave_ast::ExprError;
use sqlweave_diagnostics::{
    ErrorBuilder, ErrorCode, SQW0200, SQW0201, SQW0202, SQW0203, SQW0204, WeaveError,
};
use thiserror::Error;

/// Errors raised while resolving columns and relations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// More than one column in scope matches the reference
    #[error("Column reference '{name}' is ambiguous, it matches columns from {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// A qualified reference names a column its relation does not have
    #[error("Column '{name}' not found on '{table}'")]
    NotFoundOnTable { table: String, name: String },

    /// References left UNKNOWN when unresolved references are denied
    #[error("Unresolved column references: {}", names.join(", "))]
    Unresolved { names: Vec<String> },

    #[error("Relations nest deeper than {max_depth} levels")]
    DepthExceeded { max_depth: usize },

    #[error("'{alias}' names {found} columns but its relation has {expected}")]
    ColumnAliasCount {
        alias: String,
        expected: usize,
        found: usize,
    },

    /// A rebuilt node was rejected by its constructor
    #[error(transparent)]
    Expr(#[from] ExprError),
}

/// Result type for resolution
pub type ResolutionResult<T> = Result<T, ResolutionError>;

impl ResolutionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolutionError::Ambiguous { .. } => SQW0200,
            ResolutionError::NotFoundOnTable { .. } => SQW0201,
            ResolutionError::Unresolved { .. } => SQW0202,
            ResolutionError::DepthExceeded { .. } => SQW0203,
            ResolutionError::ColumnAliasCount { .. } => SQW0204,
            ResolutionError::Expr(err) => err.code(),
        }
    }
}

impl From<ResolutionError> for WeaveError {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Expr(err) => err.into(),
            ResolutionError::Ambiguous {
                ref candidates, ..
            } => candidates
                .iter()
                .fold(ErrorBuilder::new(err.code(), err.to_string()), |builder, source| {
                    builder.note(format!("candidate from {source}"))
                })
                .resolution(),
            other => WeaveError::resolution(other.code(), other.to_string()),
        }
    }
}
