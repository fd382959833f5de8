//! ORDER BY, GROUP BY and window clauses

use crate::{SetQuantifier, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ordering {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullOrdering {
    First,
    Last,
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub value: Value,
    pub ordering: Option<Ordering>,
    pub null_ordering: Option<NullOrdering>,
}

impl OrderTerm {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ordering: None,
            null_ordering: None,
        }
    }

    pub fn desc(mut self) -> Self {
        self.ordering = Some(Ordering::Desc);
        self
    }

    pub fn nulls(mut self, null_ordering: NullOrdering) -> Self {
        self.null_ordering = Some(null_ordering);
        self
    }
}

/// A single element of a `GROUP BY` clause
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingElement {
    /// Plain expressions; `GROUP BY ()` is the empty list
    Set(Vec<Value>),
    Rollup(Vec<Value>),
    Cube(Vec<Value>),
    GroupingSets(Vec<Vec<Value>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    pub quantifier: SetQuantifier,
    pub elements: Vec<GroupingElement>,
}

impl GroupBy {
    /// `GROUP BY a, b`
    pub fn values(values: Vec<Value>) -> Self {
        Self {
            quantifier: SetQuantifier::All,
            elements: values.into_iter().map(|v| GroupingElement::Set(vec![v])).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Box<Value>),
    CurrentRow,
    Following(Box<Value>),
    UnboundedFollowing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub frame_type: FrameType,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

/// A window specification, inline in `OVER (...)` or named in a `WINDOW` clause
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Window {
    /// Name of an existing window this one extends
    pub parent: Option<String>,
    pub partition_by: Vec<Value>,
    pub order_by: Vec<OrderTerm>,
    pub frame: Option<WindowFrame>,
}
