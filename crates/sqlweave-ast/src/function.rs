//! Built-in functions and their return-type rules
//!
//! Every function the tree knows about is a [`Function`] variant. Its
//! [`FunctionSignature`] fixes the name and the accepted argument count, and
//! [`Function::return_type`] computes the call's type from the argument nodes.
//! Most return types are fixed; the rest follow an argument (SUM keeps its
//! operand type) or the coercion lattice (IF, COALESCE, CONCAT).

use crate::{ExprError, ExprResult, Value};
use serde::{Deserialize, Serialize};
use sqlweave_types::builder::{
    array, bigint, boolean, date, double, hll, integer, interval_day_to_second, map, qdigest,
    tdigest, time, timestamp, unknown, varbinary, varchar,
};
use sqlweave_types::{
    DataType, LiteralValue, TypeName, coalesce_type, common_supertype, concat_type,
};
use std::fmt;

/// Precision of CURRENT_TIME and friends when the call omits it
pub const DEFAULT_DATETIME_PRECISION: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Scalar,
    Conditional,
    Aggregate,
}

/// Name and arity of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub kind: FunctionKind,
}

impl FunctionSignature {
    const fn new(name: &'static str, min_args: usize, max_args: usize, kind: FunctionKind) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
            kind,
        }
    }

    const fn variadic(name: &'static str, min_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: None,
            kind: FunctionKind::Conditional,
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    /// Human form of the accepted argument count: `2`, `1 to 3`, `at least 1`
    pub fn expected(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {max}", self.min_args),
            None => format!("at least {}", self.min_args),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    // Conditional
    If,
    Coalesce,
    NullIf,
    Try,
    Concat,

    // Aggregate
    Sum,
    Arbitrary,
    ArrayAgg,
    Avg,
    BoolAnd,
    BoolOr,
    Checksum,
    Count,
    CountIf,
    Every,
    GeometricMean,
    ListAgg,
    Max,
    MaxBy,
    Min,
    MinBy,
    BitwiseAndAgg,
    BitwiseOrAgg,
    Histogram,
    MapAgg,
    MapUnion,
    MultimapAgg,
    ApproxDistinct,
    ApproxMostFrequent,
    ApproxPercentile,
    ApproxSet,
    Merge,
    NumericHistogram,
    QdigestAgg,
    TdigestAgg,
    Corr,
    CovarPop,
    CovarSamp,
    Kurtosis,
    RegrIntercept,
    RegrSlope,
    Skewness,
    Stddev,
    StddevPop,
    StddevSamp,
    Variance,
    VarPop,
    VarSamp,

    // Math
    Power,

    // Session
    CurrentUser,
    CurrentCatalog,
    CurrentSchema,
    CurrentPath,

    // Date and time
    CurrentDate,
    CurrentTime,
    CurrentTimestamp,
    Localtime,
    Localtimestamp,
    Date,
    LastDayOfMonth,
    FromIso8601Timestamp,
    FromIso8601TimestampNanos,
    FromIso8601Date,
    AtTimezone,
    WithTimezone,
    FromUnixtime,
    FromUnixtimeNanos,
    Now,
    ToIso8601,
    ToMilliseconds,
    ToUnixtime,
    DateTrunc,
    DateAdd,
    DateDiff,
    ParseDuration,
    HumanReadableSeconds,

    // String
    Chr,
    Codepoint,
    HammingDistance,
    Length,
    LevenshteinDistance,
    Lower,
    Upper,
    Lpad,
    Ltrim,
    LuhnCheck,
    Replace,
    Reverse,
    Rpad,
    Rtrim,
    Soundex,
    Normalize,
    ToUtf8,
    FromUtf8,
}

impl Function {
    pub const ALL: [Function; 94] = [
        Function::If,
        Function::Coalesce,
        Function::NullIf,
        Function::Try,
        Function::Concat,
        Function::Sum,
        Function::Arbitrary,
        Function::ArrayAgg,
        Function::Avg,
        Function::BoolAnd,
        Function::BoolOr,
        Function::Checksum,
        Function::Count,
        Function::CountIf,
        Function::Every,
        Function::GeometricMean,
        Function::ListAgg,
        Function::Max,
        Function::MaxBy,
        Function::Min,
        Function::MinBy,
        Function::BitwiseAndAgg,
        Function::BitwiseOrAgg,
        Function::Histogram,
        Function::MapAgg,
        Function::MapUnion,
        Function::MultimapAgg,
        Function::ApproxDistinct,
        Function::ApproxMostFrequent,
        Function::ApproxPercentile,
        Function::ApproxSet,
        Function::Merge,
        Function::NumericHistogram,
        Function::QdigestAgg,
        Function::TdigestAgg,
        Function::Corr,
        Function::CovarPop,
        Function::CovarSamp,
        Function::Kurtosis,
        Function::RegrIntercept,
        Function::RegrSlope,
        Function::Skewness,
        Function::Stddev,
        Function::StddevPop,
        Function::StddevSamp,
        Function::Variance,
        Function::VarPop,
        Function::VarSamp,
        Function::Power,
        Function::CurrentUser,
        Function::CurrentCatalog,
        Function::CurrentSchema,
        Function::CurrentPath,
        Function::CurrentDate,
        Function::CurrentTime,
        Function::CurrentTimestamp,
        Function::Localtime,
        Function::Localtimestamp,
        Function::Date,
        Function::LastDayOfMonth,
        Function::FromIso8601Timestamp,
        Function::FromIso8601TimestampNanos,
        Function::FromIso8601Date,
        Function::AtTimezone,
        Function::WithTimezone,
        Function::FromUnixtime,
        Function::FromUnixtimeNanos,
        Function::Now,
        Function::ToIso8601,
        Function::ToMilliseconds,
        Function::ToUnixtime,
        Function::DateTrunc,
        Function::DateAdd,
        Function::DateDiff,
        Function::ParseDuration,
        Function::HumanReadableSeconds,
        Function::Chr,
        Function::Codepoint,
        Function::HammingDistance,
        Function::Length,
        Function::LevenshteinDistance,
        Function::Lower,
        Function::Upper,
        Function::Lpad,
        Function::Ltrim,
        Function::LuhnCheck,
        Function::Replace,
        Function::Reverse,
        Function::Rpad,
        Function::Rtrim,
        Function::Soundex,
        Function::Normalize,
        Function::ToUtf8,
        Function::FromUtf8,
    ];

    pub fn signature(self) -> FunctionSignature {
        use FunctionKind::{Aggregate as A, Conditional as C, Scalar as S};
        let sig = FunctionSignature::new;
        match self {
            Function::If => sig("IF", 2, 3, C),
            Function::Coalesce => FunctionSignature::variadic("COALESCE", 1),
            Function::NullIf => sig("NULLIF", 2, 2, C),
            Function::Try => sig("TRY", 1, 1, C),
            Function::Concat => FunctionSignature::variadic("CONCAT", 1),

            Function::Sum => sig("SUM", 1, 1, A),
            Function::Arbitrary => sig("ARBITRARY", 1, 1, A),
            Function::ArrayAgg => sig("ARRAY_AGG", 1, 1, A),
            Function::Avg => sig("AVG", 1, 1, A),
            Function::BoolAnd => sig("BOOL_AND", 1, 1, A),
            Function::BoolOr => sig("BOOL_OR", 1, 1, A),
            Function::Checksum => sig("CHECKSUM", 1, 1, A),
            Function::Count => sig("COUNT", 1, 1, A),
            Function::CountIf => sig("COUNT_IF", 1, 1, A),
            Function::Every => sig("EVERY", 1, 1, A),
            Function::GeometricMean => sig("GEOMETRIC_MEAN", 1, 1, A),
            Function::ListAgg => sig("LISTAGG", 1, 2, A),
            Function::Max => sig("MAX", 1, 2, A),
            Function::MaxBy => sig("MAX_BY", 2, 3, A),
            Function::Min => sig("MIN", 1, 2, A),
            Function::MinBy => sig("MIN_BY", 2, 3, A),
            Function::BitwiseAndAgg => sig("BITWISE_AND_AGG", 1, 1, A),
            Function::BitwiseOrAgg => sig("BITWISE_OR_AGG", 1, 1, A),
            Function::Histogram => sig("HISTOGRAM", 1, 1, A),
            Function::MapAgg => sig("MAP_AGG", 2, 2, A),
            Function::MapUnion => sig("MAP_UNION", 1, 1, A),
            Function::MultimapAgg => sig("MULTIMAP_AGG", 2, 2, A),
            Function::ApproxDistinct => sig("APPROX_DISTINCT", 1, 2, A),
            Function::ApproxMostFrequent => sig("APPROX_MOST_FREQUENT", 3, 3, A),
            Function::ApproxPercentile => sig("APPROX_PERCENTILE", 2, 3, A),
            Function::ApproxSet => sig("APPROX_SET", 1, 1, A),
            Function::Merge => sig("MERGE", 1, 1, A),
            Function::NumericHistogram => sig("NUMERIC_HISTOGRAM", 2, 3, A),
            Function::QdigestAgg => sig("QDIGEST_AGG", 1, 3, A),
            Function::TdigestAgg => sig("TDIGEST_AGG", 1, 2, A),
            Function::Corr => sig("CORR", 2, 2, A),
            Function::CovarPop => sig("COVAR_POP", 2, 2, A),
            Function::CovarSamp => sig("COVAR_SAMP", 2, 2, A),
            Function::Kurtosis => sig("KURTOSIS", 1, 1, A),
            Function::RegrIntercept => sig("REGR_INTERCEPT", 2, 2, A),
            Function::RegrSlope => sig("REGR_SLOPE", 2, 2, A),
            Function::Skewness => sig("SKEWNESS", 1, 1, A),
            Function::Stddev => sig("STDDEV", 1, 1, A),
            Function::StddevPop => sig("STDDEV_POP", 1, 1, A),
            Function::StddevSamp => sig("STDDEV_SAMP", 1, 1, A),
            Function::Variance => sig("VARIANCE", 1, 1, A),
            Function::VarPop => sig("VAR_POP", 1, 1, A),
            Function::VarSamp => sig("VAR_SAMP", 1, 1, A),

            Function::Power => sig("POWER", 2, 2, S),

            Function::CurrentUser => sig("CURRENT_USER", 0, 0, S),
            Function::CurrentCatalog => sig("CURRENT_CATALOG", 0, 0, S),
            Function::CurrentSchema => sig("CURRENT_SCHEMA", 0, 0, S),
            Function::CurrentPath => sig("CURRENT_PATH", 0, 0, S),

            Function::CurrentDate => sig("CURRENT_DATE", 0, 0, S),
            Function::CurrentTime => sig("CURRENT_TIME", 0, 1, S),
            Function::CurrentTimestamp => sig("CURRENT_TIMESTAMP", 0, 1, S),
            Function::Localtime => sig("LOCALTIME", 0, 1, S),
            Function::Localtimestamp => sig("LOCALTIMESTAMP", 0, 1, S),
            Function::Date => sig("DATE", 1, 1, S),
            Function::LastDayOfMonth => sig("LAST_DAY_OF_MONTH", 1, 1, S),
            Function::FromIso8601Timestamp => sig("FROM_ISO8601_TIMESTAMP", 1, 1, S),
            Function::FromIso8601TimestampNanos => sig("FROM_ISO8601_TIMESTAMP_NANOS", 1, 1, S),
            Function::FromIso8601Date => sig("FROM_ISO8601_DATE", 1, 1, S),
            Function::AtTimezone => sig("AT_TIMEZONE", 2, 2, S),
            Function::WithTimezone => sig("WITH_TIMEZONE", 2, 2, S),
            Function::FromUnixtime => sig("FROM_UNIXTIME", 1, 3, S),
            Function::FromUnixtimeNanos => sig("FROM_UNIXTIME_NANOS", 1, 1, S),
            Function::Now => sig("NOW", 0, 0, S),
            Function::ToIso8601 => sig("TO_ISO8601", 1, 1, S),
            Function::ToMilliseconds => sig("TO_MILLISECONDS", 1, 1, S),
            Function::ToUnixtime => sig("TO_UNIXTIME", 1, 1, S),
            Function::DateTrunc => sig("DATE_TRUNC", 2, 2, S),
            Function::DateAdd => sig("DATE_ADD", 3, 3, S),
            Function::DateDiff => sig("DATE_DIFF", 3, 3, S),
            Function::ParseDuration => sig("PARSE_DURATION", 1, 1, S),
            Function::HumanReadableSeconds => sig("HUMAN_READABLE_SECONDS", 1, 1, S),

            Function::Chr => sig("CHR", 1, 1, S),
            Function::Codepoint => sig("CODEPOINT", 1, 1, S),
            Function::HammingDistance => sig("HAMMING_DISTANCE", 2, 2, S),
            Function::Length => sig("LENGTH", 1, 1, S),
            Function::LevenshteinDistance => sig("LEVENSHTEIN_DISTANCE", 2, 2, S),
            Function::Lower => sig("LOWER", 1, 1, S),
            Function::Upper => sig("UPPER", 1, 1, S),
            Function::Lpad => sig("LPAD", 3, 3, S),
            Function::Ltrim => sig("LTRIM", 1, 1, S),
            Function::LuhnCheck => sig("LUHN_CHECK", 1, 1, S),
            Function::Replace => sig("REPLACE", 2, 3, S),
            Function::Reverse => sig("REVERSE", 1, 1, S),
            Function::Rpad => sig("RPAD", 3, 3, S),
            Function::Rtrim => sig("RTRIM", 1, 1, S),
            Function::Soundex => sig("SOUNDEX", 1, 1, S),
            Function::Normalize => sig("NORMALIZE", 1, 2, S),
            Function::ToUtf8 => sig("TO_UTF8", 1, 1, S),
            Function::FromUtf8 => sig("FROM_UTF8", 1, 2, S),
        }
    }

    pub fn name(self) -> &'static str {
        self.signature().name
    }

    pub fn is_aggregate(self) -> bool {
        self.signature().kind == FunctionKind::Aggregate
    }

    /// Case-insensitive lookup by SQL name
    pub fn from_name(name: &str) -> Option<Self> {
        Function::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn check_arity(self, count: usize) -> ExprResult<()> {
        let signature = self.signature();
        if signature.accepts(count) {
            Ok(())
        } else {
            Err(ExprError::Arity {
                function: self,
                expected: signature.expected(),
                found: count,
            })
        }
    }

    /// Return type of a call with these arguments.
    ///
    /// Argument-dependent rules fall back to UNKNOWN while the argument they
    /// follow is itself UNKNOWN.
    pub fn return_type(self, args: &[Value]) -> ExprResult<DataType> {
        self.check_arity(args.len())?;
        let arg = |i: usize| args.get(i).map(Value::data_type).unwrap_or_else(unknown);

        let dtype = match self {
            Function::If => match args.get(2) {
                Some(otherwise) => common_supertype(&arg(1), &otherwise.data_type())?,
                None => arg(1),
            },
            Function::Coalesce => coalesce_type(&arg_types(args))?,
            Function::Concat => concat_type(&arg_types(args))?,
            Function::NullIf | Function::Try => arg(0),

            Function::Sum
            | Function::Arbitrary
            | Function::Max
            | Function::Min
            | Function::MaxBy
            | Function::MinBy
            | Function::MapUnion => arg(0),
            Function::ArrayAgg => array(arg(0)),
            Function::Avg
            | Function::GeometricMean
            | Function::Corr
            | Function::CovarPop
            | Function::CovarSamp
            | Function::Kurtosis
            | Function::RegrIntercept
            | Function::RegrSlope
            | Function::Skewness
            | Function::Stddev
            | Function::StddevPop
            | Function::StddevSamp
            | Function::Variance
            | Function::VarPop
            | Function::VarSamp => double(),
            Function::BoolAnd | Function::BoolOr | Function::Every => boolean(),
            Function::Checksum => varbinary(),
            Function::Count
            | Function::CountIf
            | Function::ApproxDistinct
            | Function::BitwiseAndAgg
            | Function::BitwiseOrAgg => bigint(),
            Function::ListAgg => varchar(None),
            Function::Histogram => map(arg(0), bigint()),
            Function::MapAgg => map(arg(0), arg(1)),
            Function::MultimapAgg => map(arg(0), array(arg(1))),
            Function::ApproxMostFrequent => map(arg(1), bigint()),
            Function::ApproxPercentile => {
                // APPROX_PERCENTILE(value, [weight,] percentage)
                let percentage = arg(args.len() - 1);
                if percentage.is(TypeName::Array) {
                    array(arg(0))
                } else if percentage.is_unknown() {
                    unknown()
                } else {
                    arg(0)
                }
            }
            Function::ApproxSet => hll(),
            Function::Merge => {
                let digest = arg(0);
                if digest.is(TypeName::Tdigest) || digest.is(TypeName::Qdigest) {
                    digest
                } else {
                    hll()
                }
            }
            Function::NumericHistogram => map(double(), double()),
            Function::QdigestAgg => qdigest(arg(0)),
            Function::TdigestAgg => tdigest(),

            Function::Power => double(),

            Function::CurrentUser
            | Function::CurrentCatalog
            | Function::CurrentSchema
            | Function::CurrentPath => varchar(None),

            Function::CurrentDate
            | Function::Date
            | Function::LastDayOfMonth
            | Function::FromIso8601Date => date(),
            Function::CurrentTime | Function::Localtime => {
                time(Some(precision_arg(args)), false)?
            }
            Function::CurrentTimestamp | Function::Localtimestamp => {
                timestamp(Some(precision_arg(args)), false)?
            }
            Function::FromIso8601Timestamp | Function::Now => timestamp(Some(3), true)?,
            Function::FromIso8601TimestampNanos | Function::FromUnixtimeNanos => {
                timestamp(Some(9), true)?
            }
            Function::AtTimezone | Function::WithTimezone | Function::FromUnixtime => {
                let value = arg(0);
                if value.is(TypeName::Timestamp) {
                    timestamp(value.precision(), true)?
                } else {
                    unknown()
                }
            }
            Function::ToIso8601 | Function::HumanReadableSeconds => varchar(None),
            Function::ToMilliseconds | Function::DateDiff => bigint(),
            Function::ToUnixtime => double(),
            // DATE_TRUNC(unit, value)
            Function::DateTrunc => arg(1),
            // DATE_ADD(unit, amount, value)
            Function::DateAdd => arg(2),
            Function::ParseDuration => interval_day_to_second(),

            Function::Chr
            | Function::Lower
            | Function::Upper
            | Function::Lpad
            | Function::Ltrim
            | Function::Replace
            | Function::Reverse
            | Function::Rpad
            | Function::Rtrim
            | Function::Soundex
            | Function::Normalize
            | Function::FromUtf8 => varchar(None),
            Function::Codepoint => integer(),
            Function::Length | Function::HammingDistance | Function::LevenshteinDistance => {
                bigint()
            }
            Function::LuhnCheck => boolean(),
            Function::ToUtf8 => varbinary(),
        };
        Ok(dtype)
    }
}

fn arg_types(args: &[Value]) -> Vec<DataType> {
    args.iter().map(Value::data_type).collect()
}

/// Precision of `CURRENT_TIME(p)`; only an integer literal counts
fn precision_arg(args: &[Value]) -> i64 {
    match args.first() {
        Some(Value::Literal(literal)) => match literal.value {
            LiteralValue::Integer(p) => p,
            _ => DEFAULT_DATETIME_PRECISION,
        },
        _ => DEFAULT_DATETIME_PRECISION,
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_are_unique_and_round_trip() {
        for function in Function::ALL {
            assert_eq!(Function::from_name(function.name()), Some(function));
        }
        assert_eq!(Function::from_name("approx_percentile"), Some(Function::ApproxPercentile));
        assert_eq!(Function::from_name("no_such_fn"), None);
    }

    #[test]
    fn test_expected_arity_text() {
        assert_eq!(Function::NullIf.signature().expected(), "2");
        assert_eq!(Function::If.signature().expected(), "2 to 3");
        assert_eq!(Function::Coalesce.signature().expected(), "at least 1");
    }

    #[test]
    fn test_arity_error() {
        let err = Function::Power.return_type(&[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "POWER takes 2 arguments, found 0"
        );
    }

    #[test]
    fn test_default_datetime_precision() {
        assert_eq!(
            Function::CurrentTimestamp.return_type(&[]).unwrap().to_string(),
            "TIMESTAMP(3)"
        );
    }
}
