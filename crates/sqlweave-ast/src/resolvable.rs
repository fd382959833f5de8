//! Structure-preserving rebuilds
//!
//! [`Resolvable::with_resolved_children`] rebuilds a node from its children
//! after passing each child through a [`ChildResolver`]. Nodes are rebuilt
//! through their constructors, so every composite type is recomputed from the
//! rewritten children. Leaves (literals, column references, stars) are
//! copied; a resolver that wants to rewrite them intercepts them in
//! [`ChildResolver::resolve_value`] before recursing.

use crate::{
    AliasedStar, ArrayConstructor, Between, BinaryExpr, Case, Cast, ExprError, FrameBound,
    FunctionCall, GroupBy, GroupingElement, InList, InQuery, Lambda, Like, OrderTerm, Relation,
    RowConstructor, Subscript, UnaryExpr, Value, When, Window, WindowFrame,
};

/// Rewrites the children of a node
pub trait ChildResolver {
    type Error: From<ExprError>;

    fn resolve_value(&mut self, value: &Value) -> Result<Value, Self::Error>;

    /// Subqueries nested inside expressions
    fn resolve_query(&mut self, query: &Relation) -> Result<Relation, Self::Error>;
}

/// A node that can be rebuilt from rewritten children
pub trait Resolvable: Sized {
    fn with_resolved_children<R: ChildResolver>(&self, resolver: &mut R) -> Result<Self, R::Error>;
}

fn resolve_all<R: ChildResolver>(values: &[Value], resolver: &mut R) -> Result<Vec<Value>, R::Error> {
    values.iter().map(|v| resolver.resolve_value(v)).collect()
}

fn resolve_opt<R: ChildResolver>(
    value: Option<&Value>,
    resolver: &mut R,
) -> Result<Option<Value>, R::Error> {
    value.map(|v| resolver.resolve_value(v)).transpose()
}

fn boxed<R: ChildResolver>(value: &Value, resolver: &mut R) -> Result<Box<Value>, R::Error> {
    Ok(Box::new(resolver.resolve_value(value)?))
}

impl Resolvable for Value {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        let value = match self {
            Value::Literal(_)
            | Value::Field(_)
            | Value::Star(_)
            | Value::TypeConstructor(_)
            | Value::Interval(_)
            | Value::Variable(_) => self.clone(),
            Value::Aliased(node) => r.resolve_value(&node.value)?.alias(node.alias.clone())?,
            Value::AliasedStar(node) => {
                let star = match r.resolve_value(&Value::Star(node.star.clone()))? {
                    Value::Star(star) => star,
                    _ => node.star.clone(),
                };
                Value::AliasedStar(AliasedStar::new(star, node.aliases.clone()))
            }
            Value::Unary(node) => Value::Unary(UnaryExpr::new(node.op, r.resolve_value(&node.operand)?)),
            Value::Binary(node) => Value::Binary(BinaryExpr::new(
                node.op,
                r.resolve_value(&node.left)?,
                r.resolve_value(&node.right)?,
            )?),
            Value::Between(node) => Value::Between(Between {
                value: boxed(&node.value, r)?,
                low: boxed(&node.low, r)?,
                high: boxed(&node.high, r)?,
                negated: node.negated,
            }),
            Value::InList(node) => Value::InList(InList {
                value: boxed(&node.value, r)?,
                list: resolve_all(&node.list, r)?,
                negated: node.negated,
            }),
            Value::InQuery(node) => Value::InQuery(InQuery {
                value: boxed(&node.value, r)?,
                query: Box::new(r.resolve_query(&node.query)?),
                negated: node.negated,
            }),
            Value::Like(node) => Value::Like(Like {
                value: boxed(&node.value, r)?,
                pattern: boxed(&node.pattern, r)?,
                escape: resolve_opt(node.escape.as_deref(), r)?.map(Box::new),
                negated: node.negated,
            }),
            Value::Array(node) => Value::Array(ArrayConstructor::new(resolve_all(&node.elements, r)?)),
            Value::Row(node) => Value::Row(RowConstructor::new(resolve_all(&node.values, r)?)),
            Value::Cast(node) => Value::Cast(Cast::new(
                r.resolve_value(&node.value)?,
                node.target.clone(),
                node.kind,
            )?),
            Value::Subscript(node) => Value::Subscript(Subscript::new(
                r.resolve_value(&node.value)?,
                r.resolve_value(&node.index)?,
            )),
            Value::Case(node) => {
                let branches = node
                    .branches
                    .iter()
                    .map(|when| when.with_resolved_children(r))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Case(Case::new(
                    resolve_opt(node.operand.as_deref(), r)?,
                    branches,
                    resolve_opt(node.otherwise.as_deref(), r)?,
                ))
            }
            Value::Function(node) => Value::Function(node.with_resolved_children(r)?),
            Value::Lambda(node) => Value::Lambda(Lambda {
                params: node.params.clone(),
                body: boxed(&node.body, r)?,
            }),
            Value::Subquery(query) => Value::Subquery(Box::new(r.resolve_query(query)?)),
        };
        Ok(value)
    }
}

impl Resolvable for When {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(When::new(r.resolve_value(&self.condition)?, r.resolve_value(&self.value)?))
    }
}

impl Resolvable for FunctionCall {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        let mut call = FunctionCall::new(self.function, resolve_all(&self.args, r)?)?;
        call.distinct = self.distinct;
        call.filter = resolve_opt(self.filter.as_deref(), r)?.map(Box::new);
        call.order_by = self
            .order_by
            .iter()
            .map(|term| term.with_resolved_children(r))
            .collect::<Result<_, _>>()?;
        call.window = match &self.window {
            Some(window) => Some(Box::new(window.with_resolved_children(r)?)),
            None => None,
        };
        Ok(call)
    }
}

impl Resolvable for OrderTerm {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(OrderTerm {
            value: r.resolve_value(&self.value)?,
            ordering: self.ordering,
            null_ordering: self.null_ordering,
        })
    }
}

impl Resolvable for GroupingElement {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(match self {
            GroupingElement::Set(values) => GroupingElement::Set(resolve_all(values, r)?),
            GroupingElement::Rollup(values) => GroupingElement::Rollup(resolve_all(values, r)?),
            GroupingElement::Cube(values) => GroupingElement::Cube(resolve_all(values, r)?),
            GroupingElement::GroupingSets(sets) => GroupingElement::GroupingSets(
                sets.iter()
                    .map(|set| resolve_all(set, r))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl Resolvable for GroupBy {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(GroupBy {
            quantifier: self.quantifier,
            elements: self
                .elements
                .iter()
                .map(|element| element.with_resolved_children(r))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl Resolvable for FrameBound {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(match self {
            FrameBound::Preceding(offset) => FrameBound::Preceding(boxed(offset, r)?),
            FrameBound::Following(offset) => FrameBound::Following(boxed(offset, r)?),
            bound => bound.clone(),
        })
    }
}

impl Resolvable for WindowFrame {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(WindowFrame {
            frame_type: self.frame_type,
            start: self.start.with_resolved_children(r)?,
            end: self
                .end
                .as_ref()
                .map(|end| end.with_resolved_children(r))
                .transpose()?,
        })
    }
}

impl Resolvable for Window {
    fn with_resolved_children<R: ChildResolver>(&self, r: &mut R) -> Result<Self, R::Error> {
        Ok(Window {
            parent: self.parent.clone(),
            partition_by: resolve_all(&self.partition_by, r)?,
            order_by: self
                .order_by
                .iter()
                .map(|term| term.with_resolved_children(r))
                .collect::<Result<_, _>>()?,
            frame: self
                .frame
                .as_ref()
                .map(|frame| frame.with_resolved_children(r))
                .transpose()?,
        })
    }
}

/// Turns references to lambda parameters into [`Value::Variable`]s
struct VariableBinder<'a> {
    params: &'a [String],
}

impl ChildResolver for VariableBinder<'_> {
    type Error = ExprError;

    fn resolve_value(&mut self, value: &Value) -> Result<Value, ExprError> {
        match value {
            Value::Field(field) if field.table.is_none() && self.params.contains(&field.name) => {
                Ok(Value::Variable(field.name.clone()))
            }
            other => other.with_resolved_children(self),
        }
    }

    fn resolve_query(&mut self, query: &Relation) -> Result<Relation, ExprError> {
        Ok(query.clone())
    }
}

pub(crate) fn bind_variables(body: &Value, params: &[String]) -> Result<Value, ExprError> {
    VariableBinder { params }.resolve_value(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryOp, Function};
    use pretty_assertions::assert_eq;
    use sqlweave_types::builder::{bigint, double};

    /// Types every column reference as BIGINT
    struct AllBigint;

    impl ChildResolver for AllBigint {
        type Error = ExprError;

        fn resolve_value(&mut self, value: &Value) -> Result<Value, ExprError> {
            match value {
                Value::Field(field) => Ok(Value::Field(field.with_type(bigint()))),
                other => other.with_resolved_children(self),
            }
        }

        fn resolve_query(&mut self, query: &Relation) -> Result<Relation, ExprError> {
            Ok(query.clone())
        }
    }

    #[test]
    fn test_types_recomputed_bottom_up() {
        let sum = Value::binary(BinaryOp::Add, Value::field("x"), Value::literal(1_i64).unwrap()).unwrap();
        assert!(sum.data_type().is_unknown());

        let resolved = sum.with_resolved_children(&mut AllBigint).unwrap();
        assert_eq!(resolved.data_type(), bigint());
    }

    #[test]
    fn test_function_modifiers_survive() {
        let call = FunctionCall::new(Function::Sum, vec![Value::field("x")])
            .unwrap()
            .distinct()
            .filter(Value::field("flag"));
        let resolved = call.with_resolved_children(&mut AllBigint).unwrap();
        assert!(resolved.distinct);
        assert_eq!(resolved.data_type(), &bigint());
        assert_eq!(
            resolved.filter.as_deref().map(Value::data_type),
            Some(bigint())
        );
    }

    #[test]
    fn test_original_tree_untouched() {
        let avg = Value::call(Function::Avg, vec![Value::field("x")]).unwrap();
        let _ = avg.with_resolved_children(&mut AllBigint).unwrap();
        let Value::Function(call) = &avg else {
            panic!("expected a call");
        };
        assert!(call.args[0].data_type().is_unknown());
        assert_eq!(avg.data_type(), double());
    }
}
