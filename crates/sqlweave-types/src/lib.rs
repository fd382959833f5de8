//! SQL type system for sqlweave
//!
//! This crate defines:
//! - The [`DataType`] value model with per-name parameter schemas and validation
//! - Builders for every type name ([`builder`])
//! - The coercion lattice used to type operators ([`coercion`])
//! - Literal type inference ([`inference`])
//! - A parser for rendered type strings ([`parser`])

pub mod builder;
pub mod coercion;
pub mod data_type;
pub mod inference;
pub mod parser;

pub use coercion::{
    CoercionError, CoercionResult, TypeCategory, arithmetic_type, coalesce_type, common_supertype,
    concat_type, subtraction_type, variadic_supertype,
};
pub use data_type::{
    DataType, ParamKind, ParamName, ParamValue, TypeError, TypeName, TypeParameter, TypeResult,
};
pub use inference::{LiteralValue, infer_sql_literal, infer_type, infer_typed_literal};
pub use parser::{ParseTypeError, parse_data_type};

use sqlweave_diagnostics::{
    SQW0001, SQW0002, SQW0003, SQW0004, SQW0005, SQW0006, SQW0010, SQW0011, SQW0100, SQW0101,
    SQW0102, WeaveError,
};

impl TypeError {
    pub fn code(&self) -> sqlweave_diagnostics::ErrorCode {
        match self {
            TypeError::UnknownTypeName { .. } => SQW0001,
            TypeError::MissingParameter { .. } => SQW0002,
            TypeError::UnexpectedParameter { .. } => SQW0003,
            TypeError::WrongParameterKind { .. } => SQW0004,
            TypeError::OutOfRange { .. } => SQW0005,
            TypeError::InvalidInterval { .. } => SQW0006,
            TypeError::InvalidLiteral { .. } => SQW0011,
        }
    }
}

impl From<TypeError> for WeaveError {
    fn from(err: TypeError) -> Self {
        WeaveError::type_error(err.code(), err.to_string())
    }
}

impl ParseTypeError {
    pub fn code(&self) -> sqlweave_diagnostics::ErrorCode {
        match self {
            ParseTypeError::Invalid { source, .. } => source.code(),
            ParseTypeError::Syntax { .. } => SQW0010,
            ParseTypeError::TooManyParameters { .. } => SQW0003,
        }
    }

    /// Convert, keeping the parsed text so diagnostics can point into it
    pub fn into_weave_error(self, input: &str) -> WeaveError {
        WeaveError::type_error_at(self.code(), self.to_string(), input, self.span())
    }
}

impl From<ParseTypeError> for WeaveError {
    fn from(err: ParseTypeError) -> Self {
        WeaveError::type_error(err.code(), err.to_string())
    }
}

impl CoercionError {
    pub fn code(&self) -> sqlweave_diagnostics::ErrorCode {
        match self {
            CoercionError::NoCommonSupertype { .. } => SQW0100,
            CoercionError::RowArityMismatch { .. } => SQW0101,
            CoercionError::ArrayNestingMismatch { .. } => SQW0102,
            CoercionError::Type(err) => err.code(),
        }
    }
}

impl From<CoercionError> for WeaveError {
    fn from(err: CoercionError) -> Self {
        match err {
            CoercionError::Type(err) => err.into(),
            other => WeaveError::coercion(other.code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_follow_ranges() {
        let err: WeaveError = TypeError::InvalidInterval {
            from: "MONTH".into(),
            to: "DAY".into(),
        }
        .into();
        assert_eq!(err.code(), SQW0006);

        let err: WeaveError = CoercionError::RowArityMismatch { left: 1, right: 2 }.into();
        assert!(err.code().is_coercion_error());
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let input = "DECIMAL(40,2)";
        let err = parse_data_type(input).unwrap_err().into_weave_error(input);
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, SQW0005);
        assert_eq!(diag.source.as_deref(), Some(input));
    }
}
