//! sqlweave error codes
//!
//! Error code ranges:
//! - SQW0001-SQW0099: Type construction and type-string parsing
//! - SQW0100-SQW0199: Coercion (no common supertype)
//! - SQW0200-SQW0299: Field and relation resolution
//! - SQW0300-SQW0399: Expression construction
//! - SQW0400-SQW0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    pub const fn is_type_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    pub const fn is_coercion_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    pub const fn is_resolution_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    pub const fn is_expression_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQW{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Type construction (0001-0099)
    map.insert(1, ErrorInfo::new("Unknown type name"));
    map.insert(
        2,
        ErrorInfo::new("Missing required type parameter")
            .with_help("ARRAY and QDIGEST need an element type, MAP needs key and value types"),
    );
    map.insert(3, ErrorInfo::new("Unexpected type parameter"));
    map.insert(4, ErrorInfo::new("Type parameter has the wrong kind"));
    map.insert(
        5,
        ErrorInfo::new("Type parameter out of range")
            .with_help("DECIMAL precision must be within 0..=38, TIME/TIMESTAMP precision within 0..=12"),
    );
    map.insert(
        6,
        ErrorInfo::new("Invalid interval span")
            .with_help("Only INTERVAL YEAR TO MONTH and INTERVAL DAY TO SECOND exist"),
    );
    map.insert(10, ErrorInfo::new("Type string syntax error"));
    map.insert(11, ErrorInfo::new("Invalid literal"));

    // Coercion (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("No common supertype")
            .with_help("Add an explicit CAST so both operands share a type category"),
    );
    map.insert(101, ErrorInfo::new("Row arity mismatch"));
    map.insert(102, ErrorInfo::new("Array nesting mismatch in concatenation"));
    map.insert(103, ErrorInfo::new("Set query operands are not union-compatible"));

    // Resolution (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("Ambiguous column reference")
            .with_help("Qualify the column with its table or alias"),
    );
    map.insert(201, ErrorInfo::new("Column not found on table"));
    map.insert(202, ErrorInfo::new("Unresolved column references"));
    map.insert(203, ErrorInfo::new("Relation nesting too deep"));
    map.insert(204, ErrorInfo::new("Column alias count mismatch"));

    // Expression construction (0300-0399)
    map.insert(300, ErrorInfo::new("Invalid interval field"));
    map.insert(301, ErrorInfo::new("Cast target type is unknown"));
    map.insert(302, ErrorInfo::new("Invalid join configuration"));
    map.insert(303, ErrorInfo::new("Select list is empty"));
    map.insert(304, ErrorInfo::new("Wrong number of function arguments"));
    map.insert(
        305,
        ErrorInfo::new("Unsupported set quantifier")
            .with_help("INTERSECT and EXCEPT only support DISTINCT"),
    );
    map.insert(
        306,
        ErrorInfo::new("Star cannot be aliased").with_help("Use column aliases on the star instead"),
    );
    map.insert(307, ErrorInfo::new("Expected a query"));
    map.insert(
        308,
        ErrorInfo::new("Invalid table reference")
            .with_help("A catalog-qualified table must also name its schema"),
    );
    map.insert(309, ErrorInfo::new("Duplicate lambda parameter"));

    // System (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));

    map
});

// Type construction
pub const SQW0001: ErrorCode = ErrorCode::new(1);
pub const SQW0002: ErrorCode = ErrorCode::new(2);
pub const SQW0003: ErrorCode = ErrorCode::new(3);
pub const SQW0004: ErrorCode = ErrorCode::new(4);
pub const SQW0005: ErrorCode = ErrorCode::new(5);
pub const SQW0006: ErrorCode = ErrorCode::new(6);
pub const SQW0010: ErrorCode = ErrorCode::new(10);
pub const SQW0011: ErrorCode = ErrorCode::new(11);

// Coercion
pub const SQW0100: ErrorCode = ErrorCode::new(100);
pub const SQW0101: ErrorCode = ErrorCode::new(101);
pub const SQW0102: ErrorCode = ErrorCode::new(102);
pub const SQW0103: ErrorCode = ErrorCode::new(103);

// Resolution
pub const SQW0200: ErrorCode = ErrorCode::new(200);
pub const SQW0201: ErrorCode = ErrorCode::new(201);
pub const SQW0202: ErrorCode = ErrorCode::new(202);
pub const SQW0203: ErrorCode = ErrorCode::new(203);
pub const SQW0204: ErrorCode = ErrorCode::new(204);

// Expression construction
pub const SQW0300: ErrorCode = ErrorCode::new(300);
pub const SQW0301: ErrorCode = ErrorCode::new(301);
pub const SQW0302: ErrorCode = ErrorCode::new(302);
pub const SQW0303: ErrorCode = ErrorCode::new(303);
pub const SQW0304: ErrorCode = ErrorCode::new(304);
pub const SQW0305: ErrorCode = ErrorCode::new(305);
pub const SQW0306: ErrorCode = ErrorCode::new(306);
pub const SQW0307: ErrorCode = ErrorCode::new(307);
pub const SQW0308: ErrorCode = ErrorCode::new(308);
pub const SQW0309: ErrorCode = ErrorCode::new(309);

// System
pub const SQW0400: ErrorCode = ErrorCode::new(400);
pub const SQW0401: ErrorCode = ErrorCode::new(401);
pub const SQW0402: ErrorCode = ErrorCode::new(402);
