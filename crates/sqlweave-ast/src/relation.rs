//! Relation nodes
//!
//! Relations are the FROM-side of a query tree: base tables, queries, joins
//! and the wrappers around them. The four query kinds (SELECT, TABLE, VALUES
//! and set operations) are also values and carry a row type, computed by
//! their constructors like expression types are.

use crate::{
    ExprError, ExprResult, GroupBy, JoinType, OrderTerm, SampleType, SetOperation, SetQuantifier,
    Value, Window,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlweave_types::builder::{bigint, row, unknown};
use sqlweave_types::{DataType, TypeName, coalesce_type, common_supertype};
use std::fmt;

/// All relation kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    Table(Table),
    Select(Box<SelectQuery>),
    /// `TABLE t`
    TableQuery(Box<TableQuery>),
    Values(ValuesQuery),
    SetQuery(Box<SetQuery>),
    Aliased(Box<AliasedRelation>),
    Join(Box<Join>),
    Unnest(Unnest),
    Lateral(Box<Lateral>),
    TableSample(Box<TableSample>),
}

/// Discriminant of [`Relation`], used to tag anonymous schema sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationKind {
    Table,
    Select,
    TableQuery,
    Values,
    SetQuery,
    Aliased,
    Join,
    Unnest,
    Lateral,
    TableSample,
}

impl RelationKind {
    pub fn is_query(self) -> bool {
        matches!(
            self,
            RelationKind::Select
                | RelationKind::TableQuery
                | RelationKind::Values
                | RelationKind::SetQuery
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::Table => "table",
            RelationKind::Select => "select",
            RelationKind::TableQuery => "table query",
            RelationKind::Values => "values",
            RelationKind::SetQuery => "set query",
            RelationKind::Aliased => "aliased relation",
            RelationKind::Join => "join",
            RelationKind::Unnest => "unnest",
            RelationKind::Lateral => "lateral",
            RelationKind::TableSample => "table sample",
        };
        f.write_str(name)
    }
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::Table(_) => RelationKind::Table,
            Relation::Select(_) => RelationKind::Select,
            Relation::TableQuery(_) => RelationKind::TableQuery,
            Relation::Values(_) => RelationKind::Values,
            Relation::SetQuery(_) => RelationKind::SetQuery,
            Relation::Aliased(_) => RelationKind::Aliased,
            Relation::Join(_) => RelationKind::Join,
            Relation::Unnest(_) => RelationKind::Unnest,
            Relation::Lateral(_) => RelationKind::Lateral,
            Relation::TableSample(_) => RelationKind::TableSample,
        }
    }

    pub fn is_query(&self) -> bool {
        self.kind().is_query()
    }

    /// Name the relation's columns can be qualified with
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Relation::Table(table) => Some(&table.name),
            Relation::Aliased(aliased) => Some(&aliased.alias),
            _ => None,
        }
    }

    /// Row type of a query, UNKNOWN for other relations
    pub fn data_type(&self) -> DataType {
        match self {
            Relation::Select(query) => query.data_type.clone(),
            Relation::TableQuery(query) => query.data_type.clone(),
            Relation::Values(query) => query.data_type.clone(),
            Relation::SetQuery(query) => query.data_type.clone(),
            Relation::Aliased(aliased) => aliased.relation.data_type(),
            Relation::Lateral(lateral) => lateral.subquery.data_type(),
            _ => unknown(),
        }
    }

    /// Shared clauses of a query relation
    pub fn clauses(&self) -> Option<&QueryClauses> {
        match self {
            Relation::Select(query) => Some(&query.clauses),
            Relation::TableQuery(query) => Some(&query.clauses),
            Relation::Values(query) => Some(&query.clauses),
            Relation::SetQuery(query) => Some(&query.clauses),
            _ => None,
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Relation::Table(Table::new(name))
    }

    /// `relation alias`
    pub fn alias(self, alias: impl Into<String>) -> Self {
        Relation::Aliased(Box::new(AliasedRelation::new(self, alias)))
    }

    pub fn join(left: Relation, right: Relation, config: JoinConfig) -> Self {
        Relation::Join(Box::new(Join {
            left,
            right,
            config,
        }))
    }

    pub fn lateral(subquery: Relation) -> ExprResult<Self> {
        Ok(Relation::Lateral(Box::new(Lateral::new(subquery)?)))
    }

    pub fn sample(relation: Relation, sample_type: SampleType, percentage: Value) -> Self {
        Relation::TableSample(Box::new(TableSample {
            relation,
            sample_type,
            percentage,
        }))
    }
}

impl From<Table> for Relation {
    fn from(table: Table) -> Self {
        Relation::Table(table)
    }
}

impl From<SelectQuery> for Relation {
    fn from(query: SelectQuery) -> Self {
        Relation::Select(Box::new(query))
    }
}

impl From<TableQuery> for Relation {
    fn from(query: TableQuery) -> Self {
        Relation::TableQuery(Box::new(query))
    }
}

impl From<ValuesQuery> for Relation {
    fn from(query: ValuesQuery) -> Self {
        Relation::Values(query)
    }
}

impl From<SetQuery> for Relation {
    fn from(query: SetQuery) -> Self {
        Relation::SetQuery(Box::new(query))
    }
}

impl From<AliasedRelation> for Relation {
    fn from(aliased: AliasedRelation) -> Self {
        Relation::Aliased(Box::new(aliased))
    }
}

impl From<Unnest> for Relation {
    fn from(unnest: Unnest) -> Self {
        Relation::Unnest(unnest)
    }
}

/// `WITH`, `ORDER BY`, `OFFSET` and `LIMIT`, shared by every query kind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryClauses {
    /// Common table expressions; each one sees the ones declared before it
    pub with_: Vec<AliasedRelation>,
    pub order_by: Vec<OrderTerm>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// Possibly qualified base table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub catalog: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            catalog: None,
        }
    }

    /// `catalog.schema.name`; a catalog is only valid together with a schema
    pub fn qualified(
        catalog: Option<String>,
        schema: Option<String>,
        name: impl Into<String>,
    ) -> ExprResult<Self> {
        let name = name.into();
        if catalog.is_some() && schema.is_none() {
            return Err(ExprError::CatalogWithoutSchema(name));
        }
        Ok(Self {
            name,
            schema,
            catalog,
        })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in [&self.catalog, &self.schema].into_iter().flatten() {
            write!(f, "{part}.")?;
        }
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<Value>,
    pub from: Option<Relation>,
    pub where_: Option<Value>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Value>,
    pub quantifier: SetQuantifier,
    /// Named windows of the `WINDOW` clause
    pub windows: IndexMap<String, Window>,
    pub clauses: QueryClauses,
    data_type: DataType,
}

impl SelectQuery {
    pub fn new(select: Vec<Value>) -> ExprResult<Self> {
        if select.is_empty() {
            return Err(ExprError::EmptySelect);
        }
        let data_type = select_row_type(&select);
        Ok(Self {
            select,
            from: None,
            where_: None,
            group_by: None,
            having: None,
            quantifier: SetQuantifier::All,
            windows: IndexMap::new(),
            clauses: QueryClauses::default(),
            data_type,
        })
    }

    pub fn from_relation(mut self, relation: impl Into<Relation>) -> Self {
        self.from = Some(relation.into());
        self
    }

    pub fn filter(mut self, condition: Value) -> Self {
        self.where_ = Some(condition);
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn having(mut self, condition: Value) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.quantifier = SetQuantifier::Distinct;
        self
    }

    pub fn window(mut self, name: impl Into<String>, window: Window) -> Self {
        self.windows.insert(name.into(), window);
        self
    }

    pub fn with_clauses(mut self, clauses: QueryClauses) -> Self {
        self.clauses = clauses;
        self
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// Output column types of a select list, stars contributing one type per column
pub fn select_output_types(select: &[Value]) -> Vec<DataType> {
    let mut types = Vec::with_capacity(select.len());
    for value in select {
        let dtype = value.data_type();
        let is_star = matches!(value, Value::Star(_) | Value::AliasedStar(_));
        match dtype.field_types() {
            Some(fields) if is_star => types.extend_from_slice(fields),
            _ => types.push(dtype),
        }
    }
    types
}

/// A single output column is typed as itself, several as a ROW
fn select_row_type(select: &[Value]) -> DataType {
    row_or_single(select_output_types(select))
}

fn row_or_single(mut types: Vec<DataType>) -> DataType {
    match types.len() {
        0 => unknown(),
        1 => types.remove(0),
        _ => row(types),
    }
}

/// `TABLE t`, shorthand for `SELECT * FROM t`
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: Table,
    pub clauses: QueryClauses,
    data_type: DataType,
}

impl TableQuery {
    /// Unresolved table queries are UNKNOWN
    pub fn new(table: Table) -> Self {
        Self {
            table,
            clauses: QueryClauses::default(),
            data_type: unknown(),
        }
    }

    pub fn with_clauses(mut self, clauses: QueryClauses) -> Self {
        self.clauses = clauses;
        self
    }

    /// Retype from the column types the table resolved to
    pub fn with_column_types(mut self, types: Vec<DataType>) -> Self {
        self.data_type = row_or_single(types);
        self
    }
}

/// `VALUES (1, 'a'), (2, 'b')`
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesQuery {
    pub rows: Vec<Value>,
    pub clauses: QueryClauses,
    data_type: DataType,
}

impl ValuesQuery {
    /// Typed as the common supertype of the rows; NULL rows do not constrain it
    pub fn new(rows: Vec<Value>) -> ExprResult<Self> {
        let types: Vec<DataType> = rows.iter().map(Value::data_type).collect();
        let data_type = coalesce_type(&types)?;
        Ok(Self {
            rows,
            clauses: QueryClauses::default(),
            data_type,
        })
    }

    pub fn with_clauses(mut self, clauses: QueryClauses) -> Self {
        self.clauses = clauses;
        self
    }
}

/// `left UNION|INTERSECT|EXCEPT [ALL|DISTINCT] right`
#[derive(Debug, Clone, PartialEq)]
pub struct SetQuery {
    pub operation: SetOperation,
    pub quantifier: SetQuantifier,
    /// Names the output columns
    pub left: Relation,
    pub right: Relation,
    pub clauses: QueryClauses,
    data_type: DataType,
}

impl SetQuery {
    pub fn new(
        operation: SetOperation,
        quantifier: SetQuantifier,
        left: Relation,
        right: Relation,
    ) -> ExprResult<Self> {
        if operation != SetOperation::Union && quantifier != SetQuantifier::Distinct {
            return Err(ExprError::UnsupportedQuantifier {
                operation,
                quantifier,
            });
        }
        if !left.is_query() || !right.is_query() {
            return Err(ExprError::ExpectedQuery("A set operation"));
        }
        let data_type = set_row_type(&left.data_type(), &right.data_type())?;
        Ok(Self {
            operation,
            quantifier,
            left,
            right,
            clauses: QueryClauses::default(),
            data_type,
        })
    }

    pub fn with_clauses(mut self, clauses: QueryClauses) -> Self {
        self.clauses = clauses;
        self
    }
}

fn set_row_type(left: &DataType, right: &DataType) -> ExprResult<DataType> {
    if left.is_unknown() || right.is_unknown() {
        return Ok(unknown());
    }
    if left.is(TypeName::Row) != right.is(TypeName::Row) {
        return Err(ExprError::SetOperandShape {
            left: left.clone(),
            right: right.clone(),
        });
    }
    Ok(common_supertype(left, right)?)
}

/// `relation alias (c1, c2)`, also the form of a CTE
#[derive(Debug, Clone, PartialEq)]
pub struct AliasedRelation {
    pub relation: Relation,
    pub alias: String,
    pub column_aliases: Option<Vec<String>>,
}

impl AliasedRelation {
    pub fn new(relation: Relation, alias: impl Into<String>) -> Self {
        Self {
            relation,
            alias: alias.into(),
            column_aliases: None,
        }
    }

    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.column_aliases = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCriteria {
    On(Value),
    /// Column names present on both sides
    Using(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinConfig {
    pub join_type: JoinType,
    pub natural: bool,
    pub criteria: Option<JoinCriteria>,
}

impl JoinConfig {
    pub fn new(join_type: JoinType, natural: bool, criteria: Option<JoinCriteria>) -> ExprResult<Self> {
        if criteria.is_some() {
            if join_type == JoinType::Cross {
                return Err(ExprError::InvalidJoin("A cross join cannot have join criteria"));
            }
            if natural {
                return Err(ExprError::InvalidJoin("A natural join cannot have join criteria"));
            }
        }
        Ok(Self {
            join_type,
            natural,
            criteria,
        })
    }

    pub fn cross() -> Self {
        Self {
            join_type: JoinType::Cross,
            natural: false,
            criteria: None,
        }
    }

    pub fn on(join_type: JoinType, constraint: Value) -> ExprResult<Self> {
        Self::new(join_type, false, Some(JoinCriteria::On(constraint)))
    }

    pub fn using<S: Into<String>>(
        join_type: JoinType,
        columns: impl IntoIterator<Item = S>,
    ) -> ExprResult<Self> {
        let columns = columns.into_iter().map(Into::into).collect();
        Self::new(join_type, false, Some(JoinCriteria::Using(columns)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub left: Relation,
    /// Sees the columns of `left`
    pub right: Relation,
    pub config: JoinConfig,
}

/// `UNNEST(a, b) [WITH ORDINALITY]`
#[derive(Debug, Clone, PartialEq)]
pub struct Unnest {
    pub arrays: Vec<Value>,
    pub with_ordinality: bool,
    data_type: DataType,
}

impl Unnest {
    pub fn new(arrays: Vec<Value>, with_ordinality: bool) -> Self {
        let data_type = row(unnest_column_types(&arrays, with_ordinality));
        Self {
            arrays,
            with_ordinality,
            data_type,
        }
    }

    /// Element type per array operand, then BIGINT for the ordinality column
    pub fn column_types(&self) -> &[DataType] {
        self.data_type.field_types().unwrap_or_default()
    }
}

fn unnest_column_types(arrays: &[Value], with_ordinality: bool) -> Vec<DataType> {
    let mut types: Vec<DataType> = arrays
        .iter()
        .map(|value| {
            let dtype = value.data_type();
            match (dtype.is(TypeName::Array), dtype.element_type()) {
                (true, Some(element)) => element.clone(),
                _ => unknown(),
            }
        })
        .collect();
    if with_ordinality {
        types.push(bigint());
    }
    types
}

/// Correlated subquery; sees the relations to its left
#[derive(Debug, Clone, PartialEq)]
pub struct Lateral {
    pub subquery: Relation,
}

impl Lateral {
    pub fn new(subquery: Relation) -> ExprResult<Self> {
        if !subquery.is_query() {
            return Err(ExprError::ExpectedQuery("LATERAL"));
        }
        Ok(Self { subquery })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSample {
    pub relation: Relation,
    pub sample_type: SampleType,
    pub percentage: Value,
}
