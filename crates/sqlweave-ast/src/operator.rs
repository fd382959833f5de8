//! SQL operators and small enumerations shared by nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix and postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+x`
    Positive,
    /// `-x`
    Negative,
    Not,
    IsNull,
    IsNotNull,
}

impl UnaryOp {
    /// Whether the result is BOOLEAN regardless of the operand
    pub fn is_predicate(self) -> bool {
        matches!(self, UnaryOp::Not | UnaryOp::IsNull | UnaryOp::IsNotNull)
    }
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Minus,
    Multiply,
    Divide,
    Modulus,

    // Comparison
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    IsDistinctFrom,
    IsNotDistinctFrom,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulus
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulus => "%",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::IsDistinctFrom => "IS DISTINCT FROM",
            BinaryOp::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    /// Parse an arithmetic operator symbol
    pub fn arithmetic_from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Minus),
            "*" => Some(BinaryOp::Multiply),
            "/" => Some(BinaryOp::Divide),
            "%" => Some(BinaryOp::Modulus),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `ALL` or `DISTINCT` on SELECT, set operations and GROUP BY
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetQuantifier {
    #[default]
    All,
    Distinct,
}

impl fmt::Display for SetQuantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetQuantifier::All => f.write_str("ALL"),
            SetQuantifier::Distinct => f.write_str("DISTINCT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperation {
    Union,
    Intersect,
    Except,
}

impl fmt::Display for SetOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperation::Union => f.write_str("UNION"),
            SetOperation::Intersect => f.write_str("INTERSECT"),
            SetOperation::Except => f.write_str("EXCEPT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Bernoulli,
    System,
}

/// Leading and trailing fields of an interval literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntervalField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl IntervalField {
    /// YEAR and MONTH intervals are `INTERVAL YEAR TO MONTH`
    pub fn is_year_month(self) -> bool {
        matches!(self, IntervalField::Year | IntervalField::Month)
    }
}

impl std::str::FromStr for IntervalField {
    type Err = crate::ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YEAR" => Ok(IntervalField::Year),
            "MONTH" => Ok(IntervalField::Month),
            "DAY" => Ok(IntervalField::Day),
            "HOUR" => Ok(IntervalField::Hour),
            "MINUTE" => Ok(IntervalField::Minute),
            "SECOND" => Ok(IntervalField::Second),
            _ => Err(crate::ExprError::InvalidIntervalField(s.to_string())),
        }
    }
}
