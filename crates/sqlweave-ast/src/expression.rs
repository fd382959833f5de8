//! Expression nodes
//!
//! Every node computes its type when it is constructed, from the types of the
//! children it is given. Column references start out UNKNOWN, so an
//! unresolved tree carries provisional types; resolution rebuilds the tree
//! through these same constructors once the columns are typed.

use crate::{
    BinaryOp, ExprError, ExprResult, Function, IntervalField, OrderTerm, Relation, UnaryOp, Window,
};
use sqlweave_types::builder::{array, boolean, interval_day_to_second, interval_year_to_month, row, unknown};
use sqlweave_types::{
    DataType, LiteralValue, TypeName, arithmetic_type, infer_type, infer_typed_literal,
    subtraction_type,
};
use std::collections::HashSet;

/// All expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    /// Column reference
    Field(Field),
    /// `*` or `t.*`
    Star(Star),
    /// `value AS alias`
    Aliased(AliasedValue),
    /// `t.* AS (a, b)`
    AliasedStar(AliasedStar),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Between(Between),
    InList(InList),
    InQuery(InQuery),
    Like(Like),
    Array(ArrayConstructor),
    Row(RowConstructor),
    /// Typed literal, `TIMESTAMP '2021-01-01 00:00:00'`
    TypeConstructor(TypeConstructor),
    Interval(IntervalLiteral),
    Cast(Cast),
    Subscript(Subscript),
    Case(Case),
    Function(FunctionCall),
    Lambda(Lambda),
    /// Lambda parameter inside a lambda body
    Variable(String),
    /// Scalar subquery
    Subquery(Box<Relation>),
}

impl Value {
    /// Type of this node as computed at construction
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Literal(node) => node.data_type.clone(),
            Value::Field(node) => node.data_type.clone(),
            Value::Star(node) => node.data_type.clone(),
            Value::Aliased(node) => node.value.data_type(),
            Value::AliasedStar(node) => node.star.data_type.clone(),
            Value::Unary(node) => node.data_type.clone(),
            Value::Binary(node) => node.data_type.clone(),
            Value::Between(_) | Value::InList(_) | Value::InQuery(_) | Value::Like(_) => boolean(),
            Value::Array(node) => node.data_type.clone(),
            Value::Row(node) => node.data_type.clone(),
            Value::TypeConstructor(node) => node.data_type.clone(),
            Value::Interval(node) => node.data_type.clone(),
            Value::Cast(node) => node.target.clone(),
            Value::Subscript(node) => node.data_type.clone(),
            Value::Case(node) => node.data_type.clone(),
            Value::Function(node) => node.data_type.clone(),
            Value::Lambda(_) | Value::Variable(_) => unknown(),
            Value::Subquery(query) => query.data_type(),
        }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> ExprResult<Self> {
        Ok(Value::Literal(Literal::new(value.into())?))
    }

    pub fn null() -> Self {
        Value::Literal(Literal {
            value: LiteralValue::Null,
            data_type: unknown(),
        })
    }

    pub fn field(name: impl Into<String>) -> Self {
        Value::Field(Field::new(name))
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Value::Field(Field::qualified(table, name))
    }

    pub fn star() -> Self {
        Value::Star(Star::new(None))
    }

    pub fn star_of(table: impl Into<String>) -> Self {
        Value::Star(Star::new(Some(table.into())))
    }

    pub fn unary(op: UnaryOp, operand: Value) -> Self {
        Value::Unary(UnaryExpr::new(op, operand))
    }

    pub fn binary(op: BinaryOp, left: Value, right: Value) -> ExprResult<Self> {
        Ok(Value::Binary(BinaryExpr::new(op, left, right)?))
    }

    pub fn call(function: Function, args: Vec<Value>) -> ExprResult<Self> {
        Ok(Value::Function(FunctionCall::new(function, args)?))
    }

    pub fn cast(value: Value, target: DataType) -> ExprResult<Self> {
        Ok(Value::Cast(Cast::new(value, target, CastKind::Cast)?))
    }

    pub fn try_cast(value: Value, target: DataType) -> ExprResult<Self> {
        Ok(Value::Cast(Cast::new(value, target, CastKind::TryCast)?))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(ArrayConstructor::new(elements))
    }

    pub fn row(values: Vec<Value>) -> Self {
        Value::Row(RowConstructor::new(values))
    }

    pub fn subquery(query: Relation) -> Self {
        Value::Subquery(Box::new(query))
    }

    /// `INTERVAL '3' DAY TO SECOND`
    pub fn interval(value: impl Into<String>, from: &str, to: Option<&str>) -> ExprResult<Self> {
        let from = from.parse()?;
        let to = to.map(str::parse).transpose()?;
        Ok(Value::Interval(IntervalLiteral::new(value, from, to)))
    }

    /// `value AS alias`; stars take column aliases instead
    pub fn alias(self, alias: impl Into<String>) -> ExprResult<Self> {
        match self {
            Value::Star(_) | Value::AliasedStar(_) => Err(ExprError::AliasedStar),
            value => Ok(Value::Aliased(AliasedValue {
                value: Box::new(value),
                alias: alias.into(),
            })),
        }
    }

    /// Output column name of a select item, when it has one
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Value::Field(field) => Some(&field.name),
            Value::Aliased(aliased) => Some(&aliased.alias),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Value::Field(field) => Some(field),
            _ => None,
        }
    }
}

/// Literal with its inferred type
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    data_type: DataType,
}

impl Literal {
    pub fn new(value: LiteralValue) -> ExprResult<Self> {
        let data_type = infer_type(&value)?;
        Ok(Self { value, data_type })
    }
}

/// Column reference, optionally qualified by a table or alias
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub table: Option<String>,
    data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            data_type: unknown(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Some(table.into()),
            data_type: unknown(),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Copy of this reference carrying a resolved type
    pub fn with_type(&self, data_type: DataType) -> Self {
        Self {
            name: self.name.clone(),
            table: self.table.clone(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub table: Option<String>,
    data_type: DataType,
}

impl Star {
    pub fn new(table: Option<String>) -> Self {
        Self {
            table,
            data_type: unknown(),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn with_type(&self, data_type: DataType) -> Self {
        Self {
            table: self.table.clone(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasedValue {
    pub value: Box<Value>,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasedStar {
    pub star: Star,
    pub aliases: Vec<String>,
}

impl AliasedStar {
    pub fn new(star: Star, aliases: Vec<String>) -> Self {
        Self { star, aliases }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Value>,
    data_type: DataType,
}

impl UnaryExpr {
    pub fn new(op: UnaryOp, operand: Value) -> Self {
        let data_type = if op.is_predicate() {
            boolean()
        } else {
            operand.data_type()
        };
        Self {
            op,
            operand: Box::new(operand),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Value>,
    pub right: Box<Value>,
    data_type: DataType,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, left: Value, right: Value) -> ExprResult<Self> {
        let data_type = match op {
            BinaryOp::Minus => subtraction_type(&left.data_type(), &right.data_type())?,
            op if op.is_arithmetic() => arithmetic_type(&left.data_type(), &right.data_type())?,
            _ => boolean(),
        };
        Ok(Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
            data_type,
        })
    }
}

/// `value [NOT] BETWEEN low AND high`
#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub value: Box<Value>,
    pub low: Box<Value>,
    pub high: Box<Value>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InList {
    pub value: Box<Value>,
    pub list: Vec<Value>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InQuery {
    pub value: Box<Value>,
    pub query: Box<Relation>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Like {
    pub value: Box<Value>,
    pub pattern: Box<Value>,
    pub escape: Option<Box<Value>>,
    pub negated: bool,
}

/// `ARRAY[a, b, c]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayConstructor {
    pub elements: Vec<Value>,
    data_type: DataType,
}

impl ArrayConstructor {
    /// Typed by the first element; an empty array holds UNKNOWN
    pub fn new(elements: Vec<Value>) -> Self {
        let element = elements.first().map(Value::data_type).unwrap_or_else(unknown);
        Self {
            elements,
            data_type: array(element),
        }
    }
}

/// `ROW(a, b)` or `(a, b)`
#[derive(Debug, Clone, PartialEq)]
pub struct RowConstructor {
    pub values: Vec<Value>,
    data_type: DataType,
}

impl RowConstructor {
    pub fn new(values: Vec<Value>) -> Self {
        let data_type = row(values.iter().map(Value::data_type).collect());
        Self { values, data_type }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeConstructor {
    pub type_name: TypeName,
    pub text: String,
    data_type: DataType,
}

impl TypeConstructor {
    pub fn new(type_name: TypeName, text: impl Into<String>) -> ExprResult<Self> {
        let text = text.into();
        let data_type = infer_typed_literal(type_name, &text)?;
        Ok(Self {
            type_name,
            text,
            data_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalLiteral {
    pub value: String,
    pub from: IntervalField,
    pub to: Option<IntervalField>,
    data_type: DataType,
}

impl IntervalLiteral {
    pub fn new(value: impl Into<String>, from: IntervalField, to: Option<IntervalField>) -> Self {
        let data_type = if from.is_year_month() {
            interval_year_to_month()
        } else {
            interval_day_to_second()
        };
        Self {
            value: value.into(),
            from,
            to,
            data_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Cast,
    TryCast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub value: Box<Value>,
    pub target: DataType,
    pub kind: CastKind,
}

impl Cast {
    pub fn new(value: Value, target: DataType, kind: CastKind) -> ExprResult<Self> {
        if target.is_unknown() {
            return Err(ExprError::UnknownCastTarget);
        }
        Ok(Self {
            value: Box::new(value),
            target,
            kind,
        })
    }
}

/// `value[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscript {
    pub value: Box<Value>,
    pub index: Box<Value>,
    data_type: DataType,
}

impl Subscript {
    pub fn new(value: Value, index: Value) -> Self {
        let data_type = subscript_type(&value.data_type(), &index);
        Self {
            value: Box::new(value),
            index: Box::new(index),
            data_type,
        }
    }
}

fn subscript_type(container: &DataType, index: &Value) -> DataType {
    match container.name() {
        TypeName::Array => container.element_type().cloned(),
        TypeName::Map => container.value_type().cloned(),
        TypeName::Row => match index {
            // ROW fields are addressed from 1
            Value::Literal(Literal {
                value: LiteralValue::Integer(i),
                ..
            }) => usize::try_from(*i)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| container.field_types()?.get(i).cloned()),
            _ => None,
        },
        _ => None,
    }
    .unwrap_or_else(unknown)
}

/// `WHEN condition THEN value`
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    pub condition: Value,
    pub value: Value,
}

impl When {
    pub fn new(condition: Value, value: Value) -> Self {
        Self { condition, value }
    }
}

/// Simple (`CASE x WHEN ...`) or searched (`CASE WHEN ...`) conditional
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub operand: Option<Box<Value>>,
    pub branches: Vec<When>,
    pub otherwise: Option<Box<Value>>,
    data_type: DataType,
}

impl Case {
    /// Typed by the first branch
    pub fn new(operand: Option<Value>, branches: Vec<When>, otherwise: Option<Value>) -> Self {
        let data_type = branches
            .first()
            .map(|when| when.value.data_type())
            .unwrap_or_else(unknown);
        Self {
            operand: operand.map(Box::new),
            branches,
            otherwise: otherwise.map(Box::new),
            data_type,
        }
    }
}

/// Call of a built-in function, with the clauses aggregates and window functions accept
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: Function,
    pub args: Vec<Value>,
    pub distinct: bool,
    /// `FILTER (WHERE ...)`
    pub filter: Option<Box<Value>>,
    /// `ARRAY_AGG(x ORDER BY y)`
    pub order_by: Vec<OrderTerm>,
    /// `OVER (...)`
    pub window: Option<Box<Window>>,
    data_type: DataType,
}

impl FunctionCall {
    pub fn new(function: Function, args: Vec<Value>) -> ExprResult<Self> {
        let data_type = function.return_type(&args)?;
        Ok(Self {
            function,
            args,
            distinct: false,
            filter: None,
            order_by: Vec::new(),
            window: None,
            data_type,
        })
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn filter(mut self, condition: Value) -> Self {
        self.filter = Some(Box::new(condition));
        self
    }

    pub fn order_by(mut self, order_by: Vec<OrderTerm>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn over(mut self, window: Window) -> Self {
        self.window = Some(Box::new(window));
        self
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// `(x, y) -> x + y`; its type is only known at the call it is passed to
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Box<Value>,
}

impl Lambda {
    /// Column references in `body` that name a parameter become [`Value::Variable`]
    pub fn new(params: Vec<String>, body: Value) -> ExprResult<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = params.iter().find(|p| !seen.insert(p.as_str())) {
            return Err(ExprError::DuplicateLambdaParameter(dup.clone()));
        }
        let body = crate::resolvable::bind_variables(&body, &params)?;
        Ok(Self {
            params,
            body: Box::new(body),
        })
    }
}
