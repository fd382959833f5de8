//! Type coercion lattice
//!
//! This module computes the common supertype of two data types, which is the
//! result type of binary and variadic operators. It provides:
//! - `common_supertype` for pairs, dispatching on type category
//! - `arithmetic_type` and `subtraction_type` for `+ - * / %`
//! - `variadic_supertype` and `concat_type` for COALESCE, IF and CONCAT
//!
//! UNKNOWN absorbs: any pair involving UNKNOWN coerces to UNKNOWN, so an
//! unresolved operand never turns into an error before resolution runs.

use crate::builder::{
    array, char, decimal, hll, interval_day_to_second, map, row, time, timestamp, unknown, varchar,
};
use crate::data_type::{DataType, TypeError, TypeName, MAX_DECIMAL_PRECISION};
use thiserror::Error;

/// Coercion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The operands belong to unrelated type categories
    #[error("No common supertype between {left} and {right}")]
    NoCommonSupertype { left: DataType, right: DataType },

    #[error("Cannot coerce ROW of {left} fields with ROW of {right} fields")]
    RowArityMismatch { left: usize, right: usize },

    #[error("CONCAT operands nest arrays between {min} and {max} layers deep, at most one layer apart is allowed")]
    ArrayNestingMismatch { min: usize, max: usize },

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Type coercion result
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Longest CHAR the engine supports
pub const MAX_CHAR_LENGTH: i64 = 65536;

/// Broad coercion category of a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integral,
    Floating,
    Decimal,
    String,
    Datetime,
    HyperLogLog,
    /// ARRAY, MAP, ROW
    Composite,
    /// Everything with no cross-name rule
    Other,
}

impl TypeCategory {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TypeCategory::Integral | TypeCategory::Floating | TypeCategory::Decimal
        )
    }
}

impl TypeName {
    pub fn category(self) -> TypeCategory {
        match self {
            TypeName::Tinyint | TypeName::Smallint | TypeName::Integer | TypeName::Bigint => {
                TypeCategory::Integral
            }
            TypeName::Real | TypeName::Double => TypeCategory::Floating,
            TypeName::Decimal => TypeCategory::Decimal,
            TypeName::Char | TypeName::Varchar => TypeCategory::String,
            TypeName::Date | TypeName::Time | TypeName::Timestamp => TypeCategory::Datetime,
            TypeName::Hyperloglog | TypeName::P4hyperloglog => TypeCategory::HyperLogLog,
            TypeName::Array | TypeName::Map | TypeName::Row => TypeCategory::Composite,
            _ => TypeCategory::Other,
        }
    }

    /// Decimal digits an integral type needs; `None` for non-integral types
    pub fn integral_precision(self) -> Option<i64> {
        match self {
            TypeName::Tinyint => Some(3),
            TypeName::Smallint => Some(5),
            TypeName::Integer => Some(10),
            TypeName::Bigint => Some(19),
            _ => None,
        }
    }
}

/// Common supertype of two types.
///
/// Fails when the operands come from categories with no rule between them
/// (a string against an array, say). DATE against TIME is a legitimate
/// dead end and yields UNKNOWN instead.
pub fn common_supertype(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    if a.is_unknown() || b.is_unknown() {
        return Ok(unknown());
    }
    if a.name() == b.name() {
        return common_same_name(a, b);
    }

    match (a.name().category(), b.name().category()) {
        (ca, cb) if ca.is_numeric() && cb.is_numeric() => common_numeric(a, b),
        (TypeCategory::String, TypeCategory::String) => Ok(common_string(a, b)),
        (TypeCategory::Datetime, TypeCategory::Datetime) => Ok(common_datetime(a, b)),
        (TypeCategory::HyperLogLog, TypeCategory::HyperLogLog) => Ok(hll()),
        _ => Err(no_common(a, b)),
    }
}

fn no_common(a: &DataType, b: &DataType) -> CoercionError {
    CoercionError::NoCommonSupertype {
        left: a.clone(),
        right: b.clone(),
    }
}

/// Operands share a type name but may differ in parameters
fn common_same_name(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    if a == b {
        return Ok(a.clone());
    }
    match a.name() {
        TypeName::Decimal => common_decimal(a, b),
        TypeName::Varchar => Ok(common_varchar(a, b)),
        TypeName::Char => Ok(common_char(a, b)),
        TypeName::Time | TypeName::Timestamp => common_timelike(a, b),
        TypeName::Array => match (a.element_type(), b.element_type()) {
            (Some(ea), Some(eb)) => Ok(array(common_supertype(ea, eb)?)),
            _ => Ok(unknown()),
        },
        TypeName::Map => match (a.key_type(), a.value_type(), b.key_type(), b.value_type()) {
            (Some(ka), Some(va), Some(kb), Some(vb)) => {
                Ok(map(common_supertype(ka, kb)?, common_supertype(va, vb)?))
            }
            _ => Ok(unknown()),
        },
        TypeName::Row => {
            let (fa, fb) = (
                a.field_types().unwrap_or_default(),
                b.field_types().unwrap_or_default(),
            );
            if fa.len() != fb.len() {
                return Err(CoercionError::RowArityMismatch {
                    left: fa.len(),
                    right: fb.len(),
                });
            }
            let fields = fa
                .iter()
                .zip(fb)
                .map(|(x, y)| common_supertype(x, y))
                .collect::<CoercionResult<Vec<_>>>()?;
            Ok(row(fields))
        }
        // INTERVAL spans and QDIGEST element types have no widening rule
        _ => Ok(unknown()),
    }
}

fn common_numeric(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    use TypeCategory::{Decimal, Floating, Integral};

    match (a.name().category(), b.name().category()) {
        (Integral, Integral) => {
            let (pa, pb) = (a.name().integral_precision(), b.name().integral_precision());
            Ok(if pa > pb { a.clone() } else { b.clone() })
        }
        // Floating point outranks every other numeric
        (Floating, Floating) => Ok(if a.is(TypeName::Double) { a.clone() } else { b.clone() }),
        (Floating, _) => Ok(a.clone()),
        (_, Floating) => Ok(b.clone()),
        (Integral, Decimal) => common_decimal(&promote_integral_to_decimal(a)?, b),
        (Decimal, Integral) => common_decimal(a, &promote_integral_to_decimal(b)?),
        (Decimal, Decimal) => common_decimal(a, b),
        _ => Err(no_common(a, b)),
    }
}

/// `DECIMAL(digits, 0)` wide enough for every value of an integral type
pub fn promote_integral_to_decimal(dtype: &DataType) -> CoercionResult<DataType> {
    let precision = dtype
        .name()
        .integral_precision()
        .ok_or_else(|| no_common(dtype, &decimal_default()))?;
    Ok(decimal(precision, 0)?)
}

fn decimal_default() -> DataType {
    DataType::new(TypeName::Decimal, []).unwrap_or_else(|_| unknown())
}

fn common_decimal(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    let (pa, sa) = (a.precision().unwrap_or(MAX_DECIMAL_PRECISION), a.scale().unwrap_or(0));
    let (pb, sb) = (b.precision().unwrap_or(MAX_DECIMAL_PRECISION), b.scale().unwrap_or(0));
    let scale = sa.max(sb);
    let integral = pa.saturating_sub(sa).max(pb.saturating_sub(sb));
    let precision = integral.saturating_add(scale).min(MAX_DECIMAL_PRECISION);
    Ok(decimal(precision, scale)?)
}

fn common_varchar(a: &DataType, b: &DataType) -> DataType {
    match (a.max_chars(), b.max_chars()) {
        (Some(x), Some(y)) => varchar(Some(x.max(y))),
        _ => varchar(None),
    }
}

fn common_char(a: &DataType, b: &DataType) -> DataType {
    match (a.max_chars(), b.max_chars()) {
        (Some(x), Some(y)) => char(Some(x.max(y))),
        _ => char(None),
    }
}

fn common_string(a: &DataType, b: &DataType) -> DataType {
    // CHAR never widens to VARCHAR, so any CHAR operand pulls the pair to CHAR
    if a.is(TypeName::Char) || b.is(TypeName::Char) {
        common_char(&promote_varchar_to_char(a), &promote_varchar_to_char(b))
    } else {
        common_varchar(a, b)
    }
}

/// VARCHAR demoted to CHAR, capped at [`MAX_CHAR_LENGTH`].
///
/// Unbounded VARCHAR becomes the default `CHAR(1)`. Non-VARCHAR input is returned unchanged.
pub fn promote_varchar_to_char(dtype: &DataType) -> DataType {
    if !dtype.is(TypeName::Varchar) {
        return dtype.clone();
    }
    char(dtype.max_chars().map(|n| n.min(MAX_CHAR_LENGTH)))
}

fn common_datetime(a: &DataType, b: &DataType) -> DataType {
    if a.is(TypeName::Timestamp) {
        a.clone()
    } else if b.is(TypeName::Timestamp) {
        b.clone()
    } else {
        // DATE against TIME
        unknown()
    }
}

fn common_timelike(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    let precision = match (a.precision(), b.precision()) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    };
    let timezone = a.has_timezone() || b.has_timezone();
    let dtype = if a.is(TypeName::Time) {
        time(precision, timezone)?
    } else {
        timestamp(precision, timezone)?
    };
    Ok(dtype)
}

/// Result type of `+ * / %`.
///
/// Identical operands keep their type, same-name operands widen, numeric
/// operands follow the numeric ladder, and anything else is UNKNOWN.
pub fn arithmetic_type(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    if a == b {
        return Ok(a.clone());
    }
    if a.name() == b.name() {
        return common_same_name(a, b);
    }
    if a.name().category().is_numeric() && b.name().category().is_numeric() {
        return common_numeric(a, b);
    }
    Ok(unknown())
}

/// Result type of `-`: datetime differences are `INTERVAL DAY TO SECOND`
pub fn subtraction_type(a: &DataType, b: &DataType) -> CoercionResult<DataType> {
    let is_date_or_timestamp = |d: &DataType| d.is(TypeName::Timestamp) || d.is(TypeName::Date);
    if (is_date_or_timestamp(a) && is_date_or_timestamp(b))
        || (a.is(TypeName::Time) && b.is(TypeName::Time))
    {
        return Ok(interval_day_to_second());
    }
    arithmetic_type(a, b)
}

/// Fold [`common_supertype`] across operands; no operands give UNKNOWN
pub fn variadic_supertype<'a>(
    types: impl IntoIterator<Item = &'a DataType>,
) -> CoercionResult<DataType> {
    let mut types = types.into_iter();
    let Some(first) = types.next() else {
        return Ok(unknown());
    };
    types.try_fold(first.clone(), |acc, t| common_supertype(&acc, t))
}

/// Result type of COALESCE: NULL operands are skipped, UNKNOWN if nothing remains
pub fn coalesce_type(types: &[DataType]) -> CoercionResult<DataType> {
    variadic_supertype(types.iter().filter(|t| !t.is_unknown()))
}

/// Result type of CONCAT and `||`
pub fn concat_type(types: &[DataType]) -> CoercionResult<DataType> {
    if types.is_empty() || types.iter().any(DataType::is_unknown) {
        return Ok(unknown());
    }
    if types.iter().any(|t| t.is(TypeName::Array)) {
        return concat_arrays(types);
    }
    if types.iter().all(|t| t.name().category() == TypeCategory::String) {
        return Ok(concat_strings(types));
    }
    variadic_supertype(types)
}

fn concat_arrays(types: &[DataType]) -> CoercionResult<DataType> {
    let depths: Vec<usize> = types.iter().map(DataType::array_depth).collect();
    let max = depths.iter().copied().max().unwrap_or(0);
    let min = depths.iter().copied().min().unwrap_or(0);
    if max - min > 1 {
        return Err(CoercionError::ArrayNestingMismatch { min, max });
    }
    let stripped = types.iter().zip(&depths).map(|(t, depth)| {
        if *depth == max {
            t.element_type().unwrap_or(t)
        } else {
            t
        }
    });
    Ok(array(variadic_supertype(stripped)?))
}

// Concatenation adds lengths where coercion takes the max
fn concat_strings(types: &[DataType]) -> DataType {
    if types.iter().any(|t| t.is(TypeName::Char)) {
        let total = types
            .iter()
            .map(|t| promote_varchar_to_char(t).max_chars().unwrap_or(1))
            .fold(0i64, i64::saturating_add);
        return char(Some(total.min(MAX_CHAR_LENGTH)));
    }
    // A length past i64 is as good as unbounded
    let total = types
        .iter()
        .try_fold(0i64, |total, t| total.checked_add(t.max_chars()?));
    varchar(total)
}
