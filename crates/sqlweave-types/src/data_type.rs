//! SQL data type model
//!
//! A [`DataType`] is a type name from a closed set plus a keyword-parameter map.
//! Construction goes through [`DataType::new`], which:
//! - fills declared defaults for absent optional parameters
//! - rejects missing required parameters and parameters outside the schema
//! - checks each parameter's kind
//! - runs the per-type validator (precision ranges, interval spans)
//!
//! Values are immutable and compare structurally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while constructing a [`DataType`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("'{name}' is not a recognized type name")]
    UnknownTypeName { name: String },

    #[error("{type_name} requires parameter '{param}'")]
    MissingParameter { type_name: TypeName, param: ParamName },

    #[error("{type_name} does not accept parameter '{param}'")]
    UnexpectedParameter { type_name: TypeName, param: ParamName },

    #[error("parameter '{param}' of {type_name} must be {expected}")]
    WrongParameterKind {
        type_name: TypeName,
        param: ParamName,
        expected: ParamKind,
    },

    #[error("{param} {value} of {type_name} is outside {min}..={max}")]
    OutOfRange {
        type_name: TypeName,
        param: ParamName,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("INTERVAL {from} TO {to} is not supported, expected YEAR TO MONTH or DAY TO SECOND")]
    InvalidInterval { from: String, to: String },

    #[error("'{literal}' is not a valid {kind} literal")]
    InvalidLiteral { kind: String, literal: String },
}

/// Result type for type construction
pub type TypeResult<T> = Result<T, TypeError>;

/// Closed set of SQL type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeName {
    Boolean,
    Integer,
    Tinyint,
    Smallint,
    Bigint,
    Real,
    Double,
    Decimal,
    Varchar,
    Char,
    Varbinary,
    Json,
    Date,
    Time,
    Timestamp,
    Interval,
    Ipaddress,
    Uuid,
    Hyperloglog,
    P4hyperloglog,
    Qdigest,
    Tdigest,
    Array,
    Map,
    Row,
    /// Type of NULL and of anything not yet resolved
    Unknown,
}

impl TypeName {
    pub const ALL: [TypeName; 26] = [
        TypeName::Boolean,
        TypeName::Integer,
        TypeName::Tinyint,
        TypeName::Smallint,
        TypeName::Bigint,
        TypeName::Real,
        TypeName::Double,
        TypeName::Decimal,
        TypeName::Varchar,
        TypeName::Char,
        TypeName::Varbinary,
        TypeName::Json,
        TypeName::Date,
        TypeName::Time,
        TypeName::Timestamp,
        TypeName::Interval,
        TypeName::Ipaddress,
        TypeName::Uuid,
        TypeName::Hyperloglog,
        TypeName::P4hyperloglog,
        TypeName::Qdigest,
        TypeName::Tdigest,
        TypeName::Array,
        TypeName::Map,
        TypeName::Row,
        TypeName::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TypeName::Boolean => "BOOLEAN",
            TypeName::Integer => "INTEGER",
            TypeName::Tinyint => "TINYINT",
            TypeName::Smallint => "SMALLINT",
            TypeName::Bigint => "BIGINT",
            TypeName::Real => "REAL",
            TypeName::Double => "DOUBLE",
            TypeName::Decimal => "DECIMAL",
            TypeName::Varchar => "VARCHAR",
            TypeName::Char => "CHAR",
            TypeName::Varbinary => "VARBINARY",
            TypeName::Json => "JSON",
            TypeName::Date => "DATE",
            TypeName::Time => "TIME",
            TypeName::Timestamp => "TIMESTAMP",
            TypeName::Interval => "INTERVAL",
            TypeName::Ipaddress => "IPADDRESS",
            TypeName::Uuid => "UUID",
            TypeName::Hyperloglog => "HYPERLOGLOG",
            TypeName::P4hyperloglog => "P4HYPERLOGLOG",
            TypeName::Qdigest => "QDIGEST",
            TypeName::Tdigest => "TDIGEST",
            TypeName::Array => "ARRAY",
            TypeName::Map => "MAP",
            TypeName::Row => "ROW",
            TypeName::Unknown => "UNKNOWN",
        }
    }

    /// Declared parameters, in rendering order
    pub fn parameter_schema(self) -> &'static [TypeParameter] {
        match self {
            TypeName::Decimal => DECIMAL_PARAMS,
            TypeName::Varchar => VARCHAR_PARAMS,
            TypeName::Char => CHAR_PARAMS,
            TypeName::Time | TypeName::Timestamp => TIMELIKE_PARAMS,
            TypeName::Array | TypeName::Qdigest => ELEMENT_PARAMS,
            TypeName::Map => MAP_PARAMS,
            TypeName::Row => ROW_PARAMS,
            TypeName::Interval => INTERVAL_PARAMS,
            _ => &[],
        }
    }

    pub fn is_parametric(self) -> bool {
        !self.parameter_schema().is_empty()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownTypeName {
                name: s.to_string(),
            })
    }
}

/// Keyword parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    Precision,
    Scale,
    MaxChars,
    Timezone,
    Dtype,
    FromDtype,
    ToDtype,
    Dtypes,
    FromInterval,
    ToInterval,
}

impl ParamName {
    pub const fn as_str(self) -> &'static str {
        match self {
            ParamName::Precision => "precision",
            ParamName::Scale => "scale",
            ParamName::MaxChars => "max_chars",
            ParamName::Timezone => "timezone",
            ParamName::Dtype => "dtype",
            ParamName::FromDtype => "from_dtype",
            ParamName::ToDtype => "to_dtype",
            ParamName::Dtypes => "dtypes",
            ParamName::FromInterval => "from_interval",
            ParamName::ToInterval => "to_interval",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind a parameter value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Int,
    Bool,
    Type,
    Types,
    Str,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Int => write!(f, "an integer"),
            ParamKind::Bool => write!(f, "a boolean"),
            ParamKind::Type => write!(f, "a data type"),
            ParamKind::Types => write!(f, "a list of data types"),
            ParamKind::Str => write!(f, "a string"),
        }
    }
}

/// A parameter value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Type(DataType),
    Types(Vec<DataType>),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Type(_) => ParamKind::Type,
            ParamValue::Types(_) => ParamKind::Types,
            ParamValue::Str(_) => ParamKind::Str,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Type(t) => write!(f, "{t}"),
            ParamValue::Types(ts) => write_joined(f, ts),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<DataType> for ParamValue {
    fn from(value: DataType) -> Self {
        ParamValue::Type(value)
    }
}

impl From<Vec<DataType>> for ParamValue {
    fn from(value: Vec<DataType>) -> Self {
        ParamValue::Types(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

/// Default filled in for an absent optional parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Int(i64),
    Bool(bool),
}

impl From<ParamDefault> for ParamValue {
    fn from(value: ParamDefault) -> Self {
        match value {
            ParamDefault::Int(v) => ParamValue::Int(v),
            ParamDefault::Bool(v) => ParamValue::Bool(v),
        }
    }
}

/// One entry of a type's parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: ParamName,
    pub required: bool,
    pub kind: ParamKind,
    /// `None` leaves an absent parameter unspecified
    pub default: Option<ParamDefault>,
}

impl TypeParameter {
    const fn required(name: ParamName, kind: ParamKind) -> Self {
        Self {
            name,
            required: true,
            kind,
            default: None,
        }
    }

    const fn optional(name: ParamName, kind: ParamKind, default: Option<ParamDefault>) -> Self {
        Self {
            name,
            required: false,
            kind,
            default,
        }
    }
}

pub const MAX_DECIMAL_PRECISION: i64 = 38;
pub const MAX_TIMELIKE_PRECISION: i64 = 12;

const DECIMAL_PARAMS: &[TypeParameter] = &[
    TypeParameter::optional(
        ParamName::Precision,
        ParamKind::Int,
        Some(ParamDefault::Int(MAX_DECIMAL_PRECISION)),
    ),
    TypeParameter::optional(ParamName::Scale, ParamKind::Int, Some(ParamDefault::Int(0))),
];
// Absent max_chars means unbounded
const VARCHAR_PARAMS: &[TypeParameter] = &[TypeParameter::optional(
    ParamName::MaxChars,
    ParamKind::Int,
    None,
)];
const CHAR_PARAMS: &[TypeParameter] = &[TypeParameter::optional(
    ParamName::MaxChars,
    ParamKind::Int,
    Some(ParamDefault::Int(1)),
)];
// Precision has no default: the engine session decides it
const TIMELIKE_PARAMS: &[TypeParameter] = &[
    TypeParameter::optional(ParamName::Precision, ParamKind::Int, None),
    TypeParameter::optional(
        ParamName::Timezone,
        ParamKind::Bool,
        Some(ParamDefault::Bool(false)),
    ),
];
const ELEMENT_PARAMS: &[TypeParameter] = &[TypeParameter::required(ParamName::Dtype, ParamKind::Type)];
const MAP_PARAMS: &[TypeParameter] = &[
    TypeParameter::required(ParamName::FromDtype, ParamKind::Type),
    TypeParameter::required(ParamName::ToDtype, ParamKind::Type),
];
const ROW_PARAMS: &[TypeParameter] = &[TypeParameter::required(ParamName::Dtypes, ParamKind::Types)];
const INTERVAL_PARAMS: &[TypeParameter] = &[
    TypeParameter::required(ParamName::FromInterval, ParamKind::Str),
    TypeParameter::required(ParamName::ToInterval, ParamKind::Str),
];

/// A validated SQL data type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDataType")]
pub struct DataType {
    name: TypeName,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<ParamName, ParamValue>,
}

/// Unvalidated wire form of [`DataType`]
#[derive(Deserialize)]
struct RawDataType {
    name: TypeName,
    #[serde(default)]
    parameters: BTreeMap<ParamName, ParamValue>,
}

impl TryFrom<RawDataType> for DataType {
    type Error = TypeError;

    fn try_from(raw: RawDataType) -> Result<Self, Self::Error> {
        DataType::new(raw.name, raw.parameters)
    }
}

impl DataType {
    /// Build and validate a data type
    pub fn new(
        name: TypeName,
        parameters: impl IntoIterator<Item = (ParamName, ParamValue)>,
    ) -> TypeResult<Self> {
        let mut parameters: BTreeMap<ParamName, ParamValue> = parameters.into_iter().collect();
        let schema = name.parameter_schema();

        if let Some(extra) = parameters
            .keys()
            .find(|param| !schema.iter().any(|p| p.name == **param))
        {
            return Err(TypeError::UnexpectedParameter {
                type_name: name,
                param: *extra,
            });
        }

        for param in schema {
            match parameters.get(&param.name) {
                Some(value) if value.kind() != param.kind => {
                    return Err(TypeError::WrongParameterKind {
                        type_name: name,
                        param: param.name,
                        expected: param.kind,
                    });
                }
                Some(_) => {}
                None => {
                    if let Some(default) = param.default {
                        parameters.insert(param.name, default.into());
                    } else if param.required {
                        return Err(TypeError::MissingParameter {
                            type_name: name,
                            param: param.name,
                        });
                    }
                }
            }
        }

        let data_type = Self { name, parameters };
        data_type.validate()?;
        Ok(data_type)
    }

    /// A type that takes no parameters
    pub(crate) const fn bare(name: TypeName) -> Self {
        Self {
            name,
            parameters: BTreeMap::new(),
        }
    }

    /// Assemble a type whose parameters are valid by construction.
    ///
    /// Callers pass every defaulted parameter explicitly; nothing is checked.
    pub(crate) fn from_parts<const N: usize>(name: TypeName, parameters: [(ParamName, ParamValue); N]) -> Self {
        Self {
            name,
            parameters: BTreeMap::from(parameters),
        }
    }

    fn validate(&self) -> TypeResult<()> {
        match self.name {
            TypeName::Decimal => {
                self.check_range(ParamName::Precision, 0, MAX_DECIMAL_PRECISION)
            }
            TypeName::Time | TypeName::Timestamp => {
                self.check_range(ParamName::Precision, 0, MAX_TIMELIKE_PRECISION)
            }
            TypeName::Interval => {
                let from = self.str_param(ParamName::FromInterval).unwrap_or_default();
                let to = self.str_param(ParamName::ToInterval).unwrap_or_default();
                match (from, to) {
                    ("YEAR", "MONTH") | ("DAY", "SECOND") => Ok(()),
                    _ => Err(TypeError::InvalidInterval {
                        from: from.to_string(),
                        to: to.to_string(),
                    }),
                }
            }
            // Kind checks already guarantee nested parameters are data types
            _ => Ok(()),
        }
    }

    fn check_range(&self, param: ParamName, min: i64, max: i64) -> TypeResult<()> {
        match self.int_param(param) {
            Some(value) if !(min..=max).contains(&value) => Err(TypeError::OutOfRange {
                type_name: self.name,
                param,
                value,
                min,
                max,
            }),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> TypeName {
        self.name
    }

    pub fn parameters(&self) -> &BTreeMap<ParamName, ParamValue> {
        &self.parameters
    }

    pub fn param(&self, name: ParamName) -> Option<&ParamValue> {
        self.parameters.get(&name)
    }

    pub fn is(&self, name: TypeName) -> bool {
        self.name == name
    }

    pub fn is_unknown(&self) -> bool {
        self.name == TypeName::Unknown
    }

    fn int_param(&self, name: ParamName) -> Option<i64> {
        match self.parameters.get(&name) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn str_param(&self, name: ParamName) -> Option<&str> {
        match self.parameters.get(&name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    fn type_param(&self, name: ParamName) -> Option<&DataType> {
        match self.parameters.get(&name) {
            Some(ParamValue::Type(t)) => Some(t),
            _ => None,
        }
    }

    /// DECIMAL, TIME and TIMESTAMP precision
    pub fn precision(&self) -> Option<i64> {
        self.int_param(ParamName::Precision)
    }

    pub fn scale(&self) -> Option<i64> {
        self.int_param(ParamName::Scale)
    }

    /// CHAR/VARCHAR length; `None` on VARCHAR means unbounded
    pub fn max_chars(&self) -> Option<i64> {
        self.int_param(ParamName::MaxChars)
    }

    pub fn has_timezone(&self) -> bool {
        matches!(self.parameters.get(&ParamName::Timezone), Some(ParamValue::Bool(true)))
    }

    /// Element type of ARRAY and QDIGEST
    pub fn element_type(&self) -> Option<&DataType> {
        self.type_param(ParamName::Dtype)
    }

    pub fn key_type(&self) -> Option<&DataType> {
        self.type_param(ParamName::FromDtype)
    }

    pub fn value_type(&self) -> Option<&DataType> {
        self.type_param(ParamName::ToDtype)
    }

    /// Element types of ROW
    pub fn field_types(&self) -> Option<&[DataType]> {
        match self.parameters.get(&ParamName::Dtypes) {
            Some(ParamValue::Types(ts)) => Some(ts),
            _ => None,
        }
    }

    /// `(from, to)` units of INTERVAL
    pub fn interval_span(&self) -> Option<(&str, &str)> {
        Some((
            self.str_param(ParamName::FromInterval)?,
            self.str_param(ParamName::ToInterval)?,
        ))
    }

    /// Number of nested ARRAY layers, 0 for non-arrays
    pub fn array_depth(&self) -> usize {
        match (self.name, self.element_type()) {
            (TypeName::Array, Some(inner)) => inner.array_depth() + 1,
            _ => 0,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[DataType]) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            TypeName::Time | TypeName::Timestamp => {
                f.write_str(self.name.as_str())?;
                if let Some(precision) = self.precision() {
                    write!(f, "({precision})")?;
                }
                if self.has_timezone() {
                    f.write_str(" WITH TIME ZONE")?;
                }
                Ok(())
            }
            TypeName::Interval => {
                let (from, to) = self.interval_span().unwrap_or_default();
                write!(f, "INTERVAL {from} TO {to}")
            }
            _ if self.parameters.is_empty() => f.write_str(self.name.as_str()),
            _ => {
                write!(f, "{}(", self.name)?;
                let values = self
                    .name
                    .parameter_schema()
                    .iter()
                    .filter_map(|p| self.parameters.get(&p.name));
                for (i, value) in values.enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(precision: i64, scale: i64) -> DataType {
        DataType::new(
            TypeName::Decimal,
            [
                (ParamName::Precision, precision.into()),
                (ParamName::Scale, scale.into()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_are_filled() {
        let dt = DataType::new(TypeName::Decimal, []).unwrap();
        assert_eq!(dt, decimal(38, 0));

        let dt = DataType::new(TypeName::Char, []).unwrap();
        assert_eq!(dt.max_chars(), Some(1));
    }

    #[test]
    fn test_optional_without_default_stays_absent() {
        let dt = DataType::new(TypeName::Varchar, []).unwrap();
        assert_eq!(dt.max_chars(), None);
        assert_eq!(dt.to_string(), "VARCHAR");

        let dt = DataType::new(TypeName::Timestamp, []).unwrap();
        assert_eq!(dt.precision(), None);
        assert!(!dt.has_timezone());
        assert_eq!(dt.param(ParamName::Timezone), Some(&ParamValue::Bool(false)));
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = DataType::new(TypeName::Map, [(ParamName::FromDtype, DataType::bare(TypeName::Integer).into())])
            .unwrap_err();
        assert_eq!(
            err,
            TypeError::MissingParameter {
                type_name: TypeName::Map,
                param: ParamName::ToDtype
            }
        );
    }

    #[test]
    fn test_unexpected_parameter() {
        let err = DataType::new(TypeName::Integer, [(ParamName::Precision, ParamValue::Int(3))]).unwrap_err();
        assert!(matches!(err, TypeError::UnexpectedParameter { .. }));
    }

    #[test]
    fn test_wrong_kind() {
        let err = DataType::new(TypeName::Decimal, [(ParamName::Precision, "10".into())]).unwrap_err();
        assert!(matches!(
            err,
            TypeError::WrongParameterKind {
                expected: ParamKind::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_precision_ranges() {
        let err = DataType::new(TypeName::Decimal, [(ParamName::Precision, ParamValue::Int(39))]).unwrap_err();
        assert!(matches!(err, TypeError::OutOfRange { value: 39, .. }));
        assert!(DataType::new(TypeName::Decimal, [(ParamName::Precision, ParamValue::Int(0))]).is_ok());

        let err = DataType::new(TypeName::Time, [(ParamName::Precision, ParamValue::Int(13))]).unwrap_err();
        assert!(matches!(err, TypeError::OutOfRange { max: 12, .. }));
        assert!(DataType::new(TypeName::Timestamp, [(ParamName::Precision, ParamValue::Int(12))]).is_ok());
    }

    #[test]
    fn test_interval_spans() {
        let interval = |from: &str, to: &str| {
            DataType::new(
                TypeName::Interval,
                [
                    (ParamName::FromInterval, from.into()),
                    (ParamName::ToInterval, to.into()),
                ],
            )
        };
        assert!(interval("YEAR", "MONTH").is_ok());
        assert!(interval("DAY", "SECOND").is_ok());
        assert!(matches!(
            interval("YEAR", "SECOND"),
            Err(TypeError::InvalidInterval { .. })
        ));
        assert!(interval("HOUR", "SECOND").is_err());
    }

    #[test]
    fn test_rendering_uses_schema_order() {
        let dt = DataType::new(TypeName::Decimal, [(ParamName::Scale, ParamValue::Int(2))]).unwrap();
        assert_eq!(dt.to_string(), "DECIMAL(38,2)");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(decimal(7, 2), decimal(7, 2));
        assert_ne!(decimal(7, 2), decimal(7, 3));
    }

    #[test]
    fn test_type_name_from_str() {
        assert_eq!("bigint".parse::<TypeName>().unwrap(), TypeName::Bigint);
        assert_eq!("P4HyperLogLog".parse::<TypeName>().unwrap(), TypeName::P4hyperloglog);
        assert!("STRING".parse::<TypeName>().is_err());
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"name":"DECIMAL","parameters":{"precision":40}}"#;
        assert!(serde_json::from_str::<DataType>(json).is_err());

        let json = r#"{"name":"ARRAY","parameters":{"dtype":{"name":"BIGINT"}}}"#;
        let dt: DataType = serde_json::from_str(json).unwrap();
        assert_eq!(dt.to_string(), "ARRAY(BIGINT)");
    }
}
