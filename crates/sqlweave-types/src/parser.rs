//! Type-string parser
//!
//! Parses the rendered form of a [`DataType`] back into a validated value:
//! `DECIMAL(7, 2)`, `array(map(varchar, bigint))`, `TIMESTAMP(3) WITH TIME ZONE`,
//! `INTERVAL DAY TO SECOND`, `DOUBLE PRECISION`.
//!
//! Parsing happens in two steps. A chumsky grammar produces an unvalidated
//! [`RawType`] tree that remembers spans, then [`RawType::into_data_type`]
//! runs the usual [`DataType::new`] validation and attaches the span of the
//! offending node to any failure.

use crate::data_type::{DataType, ParamKind, ParamName, ParamValue, TypeError, TypeName};
use chumsky::prelude::*;
use sqlweave_diagnostics::Span;
use std::str::FromStr;
use thiserror::Error;

type Extra<'a> = extra::Err<Rich<'a, char>>;

/// A type string that failed to parse or validate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTypeError {
    #[error("{message}")]
    Syntax { message: String, span: Span },

    #[error("{source}")]
    Invalid {
        #[source]
        source: TypeError,
        span: Span,
    },

    #[error("{type_name} takes at most {max} positional parameters, found {found}")]
    TooManyParameters {
        type_name: TypeName,
        max: usize,
        found: usize,
        span: Span,
    },
}

impl ParseTypeError {
    /// Byte span of the problem inside the parsed string
    pub fn span(&self) -> Span {
        match self {
            ParseTypeError::Syntax { span, .. }
            | ParseTypeError::Invalid { span, .. }
            | ParseTypeError::TooManyParameters { span, .. } => *span,
        }
    }
}

/// Positional parameter as written
#[derive(Debug, Clone, PartialEq)]
pub enum RawArg {
    Int(i64, Span),
    Type(RawType),
}

impl RawArg {
    fn span(&self) -> Span {
        match self {
            RawArg::Int(_, span) => *span,
            RawArg::Type(raw) => raw.span,
        }
    }
}

/// Unvalidated type tree
#[derive(Debug, Clone, PartialEq)]
pub struct RawType {
    pub name: String,
    pub name_span: Span,
    pub args: Vec<RawArg>,
    /// `Some(true)` for `WITH TIME ZONE`, `Some(false)` for `WITHOUT TIME ZONE`
    pub timezone: Option<bool>,
    /// `INTERVAL <from> TO <to>` units
    pub interval: Option<(String, String)>,
    pub span: Span,
}

impl RawType {
    /// Validate into a [`DataType`]
    pub fn into_data_type(self) -> Result<DataType, ParseTypeError> {
        let invalid = |source: TypeError, span: Span| ParseTypeError::Invalid { source, span };

        let name = TypeName::from_str(&self.name).map_err(|e| invalid(e, self.name_span))?;
        let mut params: Vec<(ParamName, ParamValue)> = Vec::new();

        if let Some((from, to)) = self.interval {
            params.push((ParamName::FromInterval, ParamValue::Str(from)));
            params.push((ParamName::ToInterval, ParamValue::Str(to)));
        }
        if let Some(tz) = self.timezone {
            params.push((ParamName::Timezone, ParamValue::Bool(tz)));
        }

        if name == TypeName::Row {
            let fields = self
                .args
                .into_iter()
                .map(|arg| match arg {
                    RawArg::Type(raw) => raw.into_data_type(),
                    RawArg::Int(_, span) => Err(invalid(
                        TypeError::WrongParameterKind {
                            type_name: name,
                            param: ParamName::Dtypes,
                            expected: ParamKind::Types,
                        },
                        span,
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            params.push((ParamName::Dtypes, ParamValue::Types(fields)));
        } else {
            // Positional slots are the schema's integer and type parameters
            let slots: Vec<ParamName> = name
                .parameter_schema()
                .iter()
                .filter(|p| matches!(p.kind, ParamKind::Int | ParamKind::Type))
                .map(|p| p.name)
                .collect();
            if self.args.len() > slots.len() {
                return Err(ParseTypeError::TooManyParameters {
                    type_name: name,
                    max: slots.len(),
                    found: self.args.len(),
                    span: self.args[slots.len()].span(),
                });
            }
            for (slot, arg) in slots.into_iter().zip(self.args) {
                let value = match arg {
                    RawArg::Int(i, _) => ParamValue::Int(i),
                    RawArg::Type(raw) => ParamValue::Type(raw.into_data_type()?),
                };
                params.push((slot, value));
            }
        }

        DataType::new(name, params).map_err(|e| invalid(e, self.span))
    }
}

fn to_span(span: SimpleSpan) -> Span {
    Span::new(span.start, span.end)
}

/// Case-insensitive keyword
fn keyword<'a>(kw: &'static str) -> impl Parser<'a, &'a str, (), Extra<'a>> + Clone {
    text::ident().try_map(move |word: &str, span| {
        if word.eq_ignore_ascii_case(kw) {
            Ok(())
        } else {
            Err(Rich::custom(span, format!("expected {kw}")))
        }
    })
}

/// Grammar for a single type, surrounding whitespace allowed
pub fn type_parser<'a>() -> impl Parser<'a, &'a str, RawType, Extra<'a>> + Clone {
    recursive(|ty| {
        let int = just('-')
            .or_not()
            .then(text::int(10))
            .to_slice()
            .try_map(|digits: &str, span| {
                digits
                    .parse::<i64>()
                    .map_err(|_| Rich::custom(span, format!("{digits} does not fit in 64 bits")))
            })
            .map_with(|value, e| RawArg::Int(value, to_span(e.span())));

        let arg = int.or(ty.map(RawArg::Type)).padded();

        let args = arg
            .separated_by(just(','))
            .collect::<Vec<_>>()
            .delimited_by(just('(').padded(), just(')').padded());

        let time_zone = keyword("TIME").padded().then(keyword("ZONE"));
        let timezone = choice((
            keyword("WITH").then(time_zone.clone()).to(true),
            keyword("WITHOUT").then(time_zone).to(false),
        ))
        .padded()
        .or_not();

        let double_precision = keyword("DOUBLE")
            .then(keyword("PRECISION").padded())
            .map_with(|_, e| RawType {
                name: "DOUBLE".to_string(),
                name_span: to_span(e.span()),
                args: Vec::new(),
                timezone: None,
                interval: None,
                span: to_span(e.span()),
            });

        let unit = text::ident().map(|unit: &str| unit.to_ascii_uppercase());
        let interval = keyword("INTERVAL")
            .map_with(|_, e| to_span(e.span()))
            .then(unit.padded())
            .then_ignore(keyword("TO"))
            .then(unit.padded())
            .map_with(|((name_span, from), to), e| RawType {
                name: "INTERVAL".to_string(),
                name_span,
                args: Vec::new(),
                timezone: None,
                interval: Some((from, to)),
                span: to_span(e.span()),
            });

        let general = text::ident()
            .map_with(|name: &str, e| (name.to_string(), to_span(e.span())))
            .then(args.or_not())
            .then(timezone)
            .map_with(|(((name, name_span), args), timezone), e| RawType {
                name,
                name_span,
                args: args.unwrap_or_default(),
                timezone,
                interval: None,
                span: to_span(e.span()),
            });

        choice((double_precision, interval, general)).padded()
    })
}

/// Parse a type string without validating it
pub fn parse_raw(input: &str) -> Result<RawType, ParseTypeError> {
    type_parser()
        .then_ignore(end())
        .parse(input)
        .into_result()
        .map_err(|errors| match errors.into_iter().next() {
            Some(err) => ParseTypeError::Syntax {
                message: err.to_string(),
                span: to_span(*err.span()),
            },
            None => ParseTypeError::Syntax {
                message: "empty type string".to_string(),
                span: Span::point(0),
            },
        })
}

/// Parse and validate a type string
pub fn parse_data_type(input: &str) -> Result<DataType, ParseTypeError> {
    parse_raw(input)?.into_data_type()
}

impl FromStr for DataType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_data_type(s)
    }
}
