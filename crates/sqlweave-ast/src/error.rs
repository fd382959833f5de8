//! Errors raised while building expression and relation nodes

use crate::{Function, SetOperation, SetQuantifier};
use sqlweave_diagnostics::{
    ErrorCode, SQW0103, SQW0300, SQW0301, SQW0302, SQW0303, SQW0304, SQW0305, SQW0306, SQW0307,
    SQW0308, SQW0309, WeaveError,
};
use sqlweave_types::{CoercionError, DataType, TypeError};
use thiserror::Error;

/// Node construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("'{0}' is not an interval field, expected YEAR, MONTH, DAY, HOUR, MINUTE or SECOND")]
    InvalidIntervalField(String),

    #[error("Cannot cast to UNKNOWN")]
    UnknownCastTarget,

    #[error("{0}")]
    InvalidJoin(&'static str),

    #[error("A SELECT must select at least one value")]
    EmptySelect,

    #[error("{function} takes {expected} arguments, found {found}")]
    Arity {
        function: Function,
        expected: String,
        found: usize,
    },

    #[error("{operation} does not support {quantifier}")]
    UnsupportedQuantifier {
        operation: SetOperation,
        quantifier: SetQuantifier,
    },

    #[error("A star cannot take a single alias")]
    AliasedStar,

    #[error("{0} requires a query")]
    ExpectedQuery(&'static str),

    #[error("Table '{0}' names a catalog without a schema")]
    CatalogWithoutSchema(String),

    #[error("Lambda parameter '{0}' is declared more than once")]
    DuplicateLambdaParameter(String),

    #[error("Set operation operands must both be rows or both be scalars, found {left} and {right}")]
    SetOperandShape { left: DataType, right: DataType },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result type for node construction
pub type ExprResult<T> = Result<T, ExprError>;

impl ExprError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExprError::InvalidIntervalField(_) => SQW0300,
            ExprError::UnknownCastTarget => SQW0301,
            ExprError::InvalidJoin(_) => SQW0302,
            ExprError::EmptySelect => SQW0303,
            ExprError::Arity { .. } => SQW0304,
            ExprError::UnsupportedQuantifier { .. } => SQW0305,
            ExprError::AliasedStar => SQW0306,
            ExprError::ExpectedQuery(_) => SQW0307,
            ExprError::CatalogWithoutSchema(_) => SQW0308,
            ExprError::DuplicateLambdaParameter(_) => SQW0309,
            ExprError::SetOperandShape { .. } => SQW0103,
            ExprError::Coercion(err) => err.code(),
            ExprError::Type(err) => err.code(),
        }
    }
}

impl From<ExprError> for WeaveError {
    fn from(err: ExprError) -> Self {
        match err {
            ExprError::Coercion(err) => err.into(),
            ExprError::Type(err) => err.into(),
            ExprError::SetOperandShape { .. } => WeaveError::coercion(err.code(), err.to_string()),
            other => WeaveError::expression(other.code(), other.to_string()),
        }
    }
}
