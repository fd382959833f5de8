//! Relation resolution
//!
//! Each relation kind resolves against the ambient schema its parent hands
//! down and returns the rebuilt relation together with the schema it
//! produces. Queries open a new namespace: unless they sit directly under
//! LATERAL or TABLESAMPLE, they resolve against an empty ambient schema.

use crate::fields::star_fields;
use crate::{ResolutionError, ResolutionResult, Resolver, Schema, SchemaField, Source};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use sqlweave_ast::{
    AliasedRelation, Join, JoinConfig, JoinCriteria, Lateral, OrderTerm, QueryClauses, Relation,
    RelationKind, SelectQuery, SetQuery, Table, TableQuery, TableSample, Unnest, ValuesQuery,
    Value,
};
use sqlweave_types::builder::unknown;
use std::borrow::Cow;

/// Ambient schema for a child relation
fn isolate<'s>(relation: &Relation, ambient: &'s Schema) -> Cow<'s, Schema> {
    if relation.is_query() {
        Cow::Owned(Schema::empty())
    } else {
        Cow::Borrowed(ambient)
    }
}

impl Resolver {
    pub(crate) fn relation(
        &mut self,
        relation: &Relation,
        ambient: &Schema,
    ) -> ResolutionResult<(Relation, Schema)> {
        let max_depth = self.options().max_depth;
        if self.depth >= max_depth {
            return Err(ResolutionError::DepthExceeded { max_depth });
        }
        self.depth += 1;
        debug!("resolving {} with {} fields in scope", relation.kind(), ambient.len());
        let resolved = self.dispatch(relation, ambient);
        self.depth -= 1;

        let (relation, schema) = resolved?;
        debug!("{} produced {} fields", relation.kind(), schema.len());
        Ok((relation, schema))
    }

    fn dispatch(&mut self, relation: &Relation, ambient: &Schema) -> ResolutionResult<(Relation, Schema)> {
        match relation {
            Relation::Table(table) => Ok((relation.clone(), self.table(table, ambient))),
            Relation::Select(query) => {
                let (query, schema) = self.select(query, ambient)?;
                Ok((query.into(), schema))
            }
            Relation::TableQuery(query) => {
                let (query, schema) = self.table_query(query)?;
                Ok((query.into(), schema))
            }
            Relation::Values(query) => {
                let (query, schema) = self.values_query(query, ambient)?;
                Ok((query.into(), schema))
            }
            Relation::SetQuery(query) => {
                let (query, schema) = self.set_query(query, ambient)?;
                Ok((query.into(), schema))
            }
            Relation::Aliased(aliased) => {
                let (inner, inner_schema) =
                    self.relation(&aliased.relation, &isolate(&aliased.relation, ambient))?;
                let schema = alias_schema(aliased, &inner_schema)?;
                Ok((rebuild_alias(aliased, inner).into(), schema))
            }
            Relation::Join(join) => self.join(join, ambient),
            Relation::Unnest(unnest) => {
                let unnest = Unnest::new(self.values(&unnest.arrays, ambient)?, unnest.with_ordinality);
                let source = Source::Anonymous(RelationKind::Unnest);
                let fields = unnest
                    .column_types()
                    .iter()
                    .map(|dtype| SchemaField::unnamed(source.clone(), dtype.clone()))
                    .collect();
                Ok((unnest.into(), Schema::new(fields, IndexSet::new())))
            }
            Relation::Lateral(lateral) => {
                let (subquery, schema) = self.relation(&lateral.subquery, ambient)?;
                Ok((Relation::Lateral(Box::new(Lateral::new(subquery)?)), schema))
            }
            Relation::TableSample(sample) => {
                let (inner, schema) = self.relation(&sample.relation, ambient)?;
                let node = TableSample {
                    relation: inner,
                    sample_type: sample.sample_type,
                    percentage: self.value(&sample.percentage, ambient)?,
                };
                Ok((Relation::TableSample(Box::new(node)), schema))
            }
        }
    }

    /// A table bound in scope (by the caller or a CTE) takes its columns from there
    fn table(&mut self, table: &Table, ambient: &Schema) -> Schema {
        let fields = if ambient.binds(&table.name) {
            ambient.fields_from(&table.name).cloned().collect()
        } else if self.catalog().binds(&table.name) {
            self.catalog().fields_from(&table.name).cloned().collect()
        } else {
            Vec::new()
        };
        let schema = Schema::new(fields, IndexSet::from([table.name.clone()]));
        self.record_table(&table.name, &schema);
        schema
    }

    fn select(&mut self, query: &SelectQuery, ambient: &Schema) -> ResolutionResult<(SelectQuery, Schema)> {
        let (with_, with_schema) = self.ctes(&query.clauses.with_)?;
        let (from, scope) = match &query.from {
            Some(from) => {
                let visible = ambient.merge(&with_schema);
                let (from, schema) = self.relation(from, &isolate(from, &visible))?;
                (Some(from), schema)
            }
            None => (None, Schema::empty()),
        };

        let mut resolved = SelectQuery::new(self.values(&query.select, &scope)?)?;
        resolved.from = from;
        resolved.where_ = self.optional(query.where_.as_ref(), &scope)?;
        resolved.group_by = query
            .group_by
            .as_ref()
            .map(|group_by| self.children(group_by, &scope))
            .transpose()?;
        resolved.having = self.optional(query.having.as_ref(), &scope)?;
        resolved.quantifier = query.quantifier;
        resolved.windows = query
            .windows
            .iter()
            .map(|(name, window)| self.children(window, &scope).map(|window| (name.clone(), window)))
            .collect::<ResolutionResult<IndexMap<_, _>>>()?;
        resolved.clauses = self.clauses(&query.clauses, with_, &scope)?;

        let schema = select_schema(&resolved.select, &scope);
        Ok((resolved, schema))
    }

    /// `TABLE t` only sees its own CTEs
    fn table_query(&mut self, query: &TableQuery) -> ResolutionResult<(TableQuery, Schema)> {
        let (with_, with_schema) = self.ctes(&query.clauses.with_)?;
        let schema = self.table(&query.table, &with_schema);
        let clauses = self.clauses(&query.clauses, with_, &schema)?;
        let resolved = TableQuery::new(query.table.clone())
            .with_column_types(schema.data_types())
            .with_clauses(clauses);
        Ok((resolved, schema))
    }

    fn values_query(&mut self, query: &ValuesQuery, ambient: &Schema) -> ResolutionResult<(ValuesQuery, Schema)> {
        let (with_, _) = self.ctes(&query.clauses.with_)?;
        let rows = self.values(&query.rows, ambient)?;
        let source = Source::Anonymous(RelationKind::Values);
        let fields = rows
            .iter()
            .map(|row| SchemaField::unnamed(source.clone(), row.data_type()))
            .collect();
        let schema = Schema::new(fields, IndexSet::new());
        let clauses = self.clauses(&query.clauses, with_, &schema)?;
        Ok((ValuesQuery::new(rows)?.with_clauses(clauses), schema))
    }

    /// Column names come from the left operand
    fn set_query(&mut self, query: &SetQuery, ambient: &Schema) -> ResolutionResult<(SetQuery, Schema)> {
        let (with_, _) = self.ctes(&query.clauses.with_)?;
        let (left, left_schema) = self.relation(&query.left, &isolate(&query.left, ambient))?;
        let (right, _) = self.relation(&query.right, &isolate(&query.right, ambient))?;

        let source = Source::Anonymous(RelationKind::SetQuery);
        let fields = left_schema
            .fields
            .iter()
            .map(|field| field.resourced(source.clone()))
            .collect();
        let schema = Schema::new(fields, left_schema.relation_ids.clone());
        let clauses = self.clauses(&query.clauses, with_, &schema)?;
        let resolved =
            SetQuery::new(query.operation, query.quantifier, left, right)?.with_clauses(clauses);
        Ok((resolved, schema))
    }

    /// The right side sees the left side, so `a CROSS JOIN UNNEST(a.xs)` resolves
    fn join(&mut self, join: &Join, ambient: &Schema) -> ResolutionResult<(Relation, Schema)> {
        let (left, left_schema) = self.relation(&join.left, &isolate(&join.left, ambient))?;
        let visible = ambient.merge(&left_schema);
        let (right, right_schema) = self.relation(&join.right, &isolate(&join.right, &visible))?;
        let schema = left_schema.merge(&right_schema);

        let criteria = match &join.config.criteria {
            Some(JoinCriteria::On(constraint)) => Some(JoinCriteria::On(self.value(constraint, &schema)?)),
            other => other.clone(),
        };
        let config = JoinConfig {
            join_type: join.config.join_type,
            natural: join.config.natural,
            criteria,
        };
        Ok((Relation::join(left, right, config), schema))
    }

    /// CTEs resolve in order, each seeing only the ones before it
    fn ctes(&mut self, ctes: &[AliasedRelation]) -> ResolutionResult<(Vec<AliasedRelation>, Schema)> {
        let mut bound = Schema::empty();
        let mut resolved = Vec::with_capacity(ctes.len());
        for cte in ctes {
            let (inner, inner_schema) = self.relation(&cte.relation, &bound)?;
            bound = bound.merge(&alias_schema(cte, &inner_schema)?);
            resolved.push(rebuild_alias(cte, inner));
        }
        Ok((resolved, bound))
    }

    fn clauses(
        &mut self,
        clauses: &QueryClauses,
        with_: Vec<AliasedRelation>,
        scope: &Schema,
    ) -> ResolutionResult<QueryClauses> {
        Ok(QueryClauses {
            with_,
            order_by: self.order_by(&clauses.order_by, scope)?,
            offset: clauses.offset,
            limit: clauses.limit,
        })
    }

    fn order_by(&mut self, terms: &[OrderTerm], scope: &Schema) -> ResolutionResult<Vec<OrderTerm>> {
        terms.iter().map(|term| self.children(term, scope)).collect()
    }

    fn optional(&mut self, value: Option<&Value>, scope: &Schema) -> ResolutionResult<Option<Value>> {
        value.map(|value| self.value(value, scope)).transpose()
    }
}

fn rebuild_alias(aliased: &AliasedRelation, inner: Relation) -> AliasedRelation {
    AliasedRelation {
        relation: inner,
        alias: aliased.alias.clone(),
        column_aliases: aliased.column_aliases.clone(),
    }
}

/// Re-source a relation's columns to its alias, renaming them positionally
fn alias_schema(aliased: &AliasedRelation, inner: &Schema) -> ResolutionResult<Schema> {
    let source = Source::Named(aliased.alias.clone());
    let fields = match &aliased.column_aliases {
        None => inner
            .fields
            .iter()
            .map(|field| field.resourced(source.clone()))
            .collect(),
        // Columns of an unknown relation are named but untyped
        Some(columns) if inner.fields.is_empty() => columns
            .iter()
            .map(|column| SchemaField::new(Some(column.clone()), source.clone(), unknown()))
            .collect(),
        Some(columns) if columns.len() != inner.fields.len() => {
            return Err(ResolutionError::ColumnAliasCount {
                alias: aliased.alias.clone(),
                expected: inner.fields.len(),
                found: columns.len(),
            });
        }
        Some(columns) => columns
            .iter()
            .zip(&inner.fields)
            .map(|(column, field)| {
                SchemaField::new(Some(column.clone()), source.clone(), field.data_type.clone())
            })
            .collect(),
    };
    Ok(Schema::new(fields, IndexSet::from([aliased.alias.clone()])))
}

/// Output columns of a resolved select list; stars expand to one column per field
fn select_schema(select: &[Value], scope: &Schema) -> Schema {
    let source = Source::Anonymous(RelationKind::Select);
    let mut fields = Vec::with_capacity(select.len());
    for value in select {
        match value {
            Value::Star(star) => fields.extend(
                star_fields(star, scope)
                    .into_iter()
                    .map(|field| field.resourced(source.clone())),
            ),
            Value::AliasedStar(aliased) => fields.extend(
                star_fields(&aliased.star, scope)
                    .into_iter()
                    .enumerate()
                    .map(|(i, field)| {
                        SchemaField::new(
                            aliased.aliases.get(i).cloned(),
                            source.clone(),
                            field.data_type.clone(),
                        )
                    }),
            ),
            value => fields.push(SchemaField::new(
                value.output_name().map(str::to_string),
                source.clone(),
                value.data_type(),
            )),
        }
    }
    Schema::new(fields, IndexSet::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlweave_types::builder::{bigint, integer};

    fn aliased(columns: Option<Vec<&str>>) -> AliasedRelation {
        let relation = AliasedRelation::new(Relation::table("t"), "q");
        match columns {
            Some(columns) => relation.with_columns(columns),
            None => relation,
        }
    }

    #[test]
    fn test_alias_renames_positionally() {
        let inner = Schema::table("t", [("a", bigint()), ("b", integer())]);
        let schema = alias_schema(&aliased(Some(vec!["x", "y"])), &inner).unwrap();
        assert_eq!(
            schema,
            Schema::table("q", [("x", bigint()), ("y", integer())])
        );
    }

    #[test]
    fn test_alias_count_must_match_known_columns() {
        let inner = Schema::table("t", [("a", bigint())]);
        let err = alias_schema(&aliased(Some(vec!["x", "y"])), &inner).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::ColumnAliasCount {
                alias: "q".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_alias_of_unknown_relation_names_columns() {
        let inner = Schema::table("t", Vec::<(&str, _)>::new());
        let schema = alias_schema(&aliased(Some(vec!["x"])), &inner).unwrap();
        assert_eq!(schema, Schema::table("q", [("x", unknown())]));
    }

    #[test]
    fn test_only_queries_are_isolated() {
        let ambient = Schema::table("t", [("a", bigint())]);
        assert_eq!(*isolate(&Relation::table("u"), &ambient), ambient);

        let query = SelectQuery::new(vec![Value::field("a")]).unwrap();
        assert!(isolate(&query.into(), &ambient).is_empty());
    }
}
