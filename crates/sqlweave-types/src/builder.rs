//! Constructors, one per type name
//!
//! Types whose parameters cannot be out of range are built infallibly;
//! DECIMAL, TIME, TIMESTAMP and INTERVAL validate and return [`TypeResult`].

use crate::data_type::{DataType, ParamName, ParamValue, TypeName, TypeResult};

pub fn boolean() -> DataType {
    DataType::bare(TypeName::Boolean)
}

pub fn tinyint() -> DataType {
    DataType::bare(TypeName::Tinyint)
}

pub fn smallint() -> DataType {
    DataType::bare(TypeName::Smallint)
}

pub fn integer() -> DataType {
    DataType::bare(TypeName::Integer)
}

pub fn bigint() -> DataType {
    DataType::bare(TypeName::Bigint)
}

pub fn real() -> DataType {
    DataType::bare(TypeName::Real)
}

pub fn double() -> DataType {
    DataType::bare(TypeName::Double)
}

pub fn varbinary() -> DataType {
    DataType::bare(TypeName::Varbinary)
}

pub fn json() -> DataType {
    DataType::bare(TypeName::Json)
}

pub fn date() -> DataType {
    DataType::bare(TypeName::Date)
}

pub fn ipaddress() -> DataType {
    DataType::bare(TypeName::Ipaddress)
}

pub fn uuid() -> DataType {
    DataType::bare(TypeName::Uuid)
}

pub fn hll() -> DataType {
    DataType::bare(TypeName::Hyperloglog)
}

pub fn p4hll() -> DataType {
    DataType::bare(TypeName::P4hyperloglog)
}

pub fn tdigest() -> DataType {
    DataType::bare(TypeName::Tdigest)
}

pub fn unknown() -> DataType {
    DataType::bare(TypeName::Unknown)
}

/// `DECIMAL(precision, scale)`; precision must be within `0..=38`
pub fn decimal(precision: i64, scale: i64) -> TypeResult<DataType> {
    DataType::new(
        TypeName::Decimal,
        [
            (ParamName::Precision, ParamValue::Int(precision)),
            (ParamName::Scale, ParamValue::Int(scale)),
        ],
    )
}

/// `VARCHAR(n)`, or unbounded `VARCHAR` for `None`
pub fn varchar(max_chars: Option<i64>) -> DataType {
    match max_chars {
        Some(n) => DataType::from_parts(TypeName::Varchar, [(ParamName::MaxChars, ParamValue::Int(n))]),
        None => DataType::bare(TypeName::Varchar),
    }
}

/// `CHAR(n)`; `None` takes the default length of 1
pub fn char(max_chars: Option<i64>) -> DataType {
    DataType::from_parts(
        TypeName::Char,
        [(ParamName::MaxChars, ParamValue::Int(max_chars.unwrap_or(1)))],
    )
}

pub fn time(precision: Option<i64>, timezone: bool) -> TypeResult<DataType> {
    timelike(TypeName::Time, precision, timezone)
}

pub fn timestamp(precision: Option<i64>, timezone: bool) -> TypeResult<DataType> {
    timelike(TypeName::Timestamp, precision, timezone)
}

fn timelike(name: TypeName, precision: Option<i64>, timezone: bool) -> TypeResult<DataType> {
    let mut params = vec![(ParamName::Timezone, ParamValue::Bool(timezone))];
    if let Some(p) = precision {
        params.push((ParamName::Precision, ParamValue::Int(p)));
    }
    DataType::new(name, params)
}

/// `INTERVAL from TO to`; units are matched case-insensitively
pub fn interval(from: &str, to: &str) -> TypeResult<DataType> {
    DataType::new(
        TypeName::Interval,
        [
            (ParamName::FromInterval, ParamValue::Str(from.to_ascii_uppercase())),
            (ParamName::ToInterval, ParamValue::Str(to.to_ascii_uppercase())),
        ],
    )
}

pub fn interval_year_to_month() -> DataType {
    DataType::from_parts(
        TypeName::Interval,
        [
            (ParamName::FromInterval, ParamValue::Str("YEAR".into())),
            (ParamName::ToInterval, ParamValue::Str("MONTH".into())),
        ],
    )
}

pub fn interval_day_to_second() -> DataType {
    DataType::from_parts(
        TypeName::Interval,
        [
            (ParamName::FromInterval, ParamValue::Str("DAY".into())),
            (ParamName::ToInterval, ParamValue::Str("SECOND".into())),
        ],
    )
}

pub fn array(dtype: DataType) -> DataType {
    DataType::from_parts(TypeName::Array, [(ParamName::Dtype, ParamValue::Type(dtype))])
}

pub fn map(from_dtype: DataType, to_dtype: DataType) -> DataType {
    DataType::from_parts(
        TypeName::Map,
        [
            (ParamName::FromDtype, ParamValue::Type(from_dtype)),
            (ParamName::ToDtype, ParamValue::Type(to_dtype)),
        ],
    )
}

pub fn row(dtypes: Vec<DataType>) -> DataType {
    DataType::from_parts(TypeName::Row, [(ParamName::Dtypes, ParamValue::Types(dtypes))])
}

pub fn qdigest(dtype: DataType) -> DataType {
    DataType::from_parts(TypeName::Qdigest, [(ParamName::Dtype, ParamValue::Type(dtype))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builders_match_validated_construction() {
        assert_eq!(char(None), DataType::new(TypeName::Char, []).unwrap());
        assert_eq!(varchar(None), DataType::new(TypeName::Varchar, []).unwrap());
        assert_eq!(
            array(bigint()),
            DataType::new(TypeName::Array, [(ParamName::Dtype, bigint().into())]).unwrap()
        );
        assert_eq!(interval("day", "second").unwrap(), interval_day_to_second());
        assert_eq!(interval("YEAR", "MONTH").unwrap(), interval_year_to_month());
    }

    #[test]
    fn test_rendering() {
        assert_eq!(boolean().to_string(), "BOOLEAN");
        assert_eq!(decimal(7, 2).unwrap().to_string(), "DECIMAL(7,2)");
        assert_eq!(varchar(Some(5)).to_string(), "VARCHAR(5)");
        assert_eq!(char(None).to_string(), "CHAR(1)");
        assert_eq!(timestamp(None, false).unwrap().to_string(), "TIMESTAMP");
        assert_eq!(timestamp(Some(3), true).unwrap().to_string(), "TIMESTAMP(3) WITH TIME ZONE");
        assert_eq!(time(None, true).unwrap().to_string(), "TIME WITH TIME ZONE");
        assert_eq!(interval_year_to_month().to_string(), "INTERVAL YEAR TO MONTH");
        assert_eq!(map(varchar(None), array(integer())).to_string(), "MAP(VARCHAR,ARRAY(INTEGER))");
        assert_eq!(row(vec![bigint(), double()]).to_string(), "ROW(BIGINT,DOUBLE)");
        assert_eq!(row(vec![]).to_string(), "ROW()");
        assert_eq!(qdigest(real()).to_string(), "QDIGEST(REAL)");
    }

    #[test]
    fn test_fallible_builders() {
        assert!(decimal(39, 0).is_err());
        assert!(timestamp(Some(13), false).is_err());
        assert!(interval("MONTH", "DAY").is_err());
    }
}
