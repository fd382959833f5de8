//! Column reference resolution inside expressions

use crate::{ResolutionError, ResolutionResult, Resolver, Schema, SchemaField};
use log::trace;
use sqlweave_ast::{ChildResolver, Field, Relation, Resolvable, Star, Value};
use sqlweave_types::builder::row;

/// Rewrites `Field` and `Star` leaves against one schema
struct FieldResolver<'a> {
    resolver: &'a mut Resolver,
    schema: &'a Schema,
}

impl ChildResolver for FieldResolver<'_> {
    type Error = ResolutionError;

    fn resolve_value(&mut self, value: &Value) -> ResolutionResult<Value> {
        match value {
            Value::Field(field) => self.field(field).map(Value::Field),
            Value::Star(star) => Ok(Value::Star(resolve_star(star, self.schema))),
            other => other.with_resolved_children(self),
        }
    }

    // Subqueries in expressions never see the enclosing scope
    fn resolve_query(&mut self, query: &Relation) -> ResolutionResult<Relation> {
        let (query, _) = self.resolver.relation(query, &Schema::empty())?;
        Ok(query)
    }
}

impl FieldResolver<'_> {
    fn field(&mut self, field: &Field) -> ResolutionResult<Field> {
        let schema = self.schema;
        let matches: Vec<&SchemaField> = schema.fields_named(&field.name).collect();
        trace!(
            "column {} matches {} of {} fields",
            display_reference(field),
            matches.len(),
            schema.len()
        );

        // A qualifier bound elsewhere (an outer query) matches nothing here
        let foreign = field.table.as_ref().is_some_and(|table| !schema.binds(table));
        let matched = match (&field.table, matches.as_slice()) {
            _ if foreign || matches.is_empty() => {
                self.resolver.unresolved.push(display_reference(field));
                return Ok(field.clone());
            }
            (None, [only]) => *only,
            (None, _) => {
                return Err(ResolutionError::Ambiguous {
                    name: field.name.clone(),
                    candidates: matches.iter().map(|m| m.source.to_string()).collect(),
                });
            }
            (Some(table), _) => {
                let on_table: Vec<&SchemaField> =
                    matches.iter().copied().filter(|m| m.is_from(table)).collect();
                match on_table.as_slice() {
                    [only] => *only,
                    [] => {
                        return Err(ResolutionError::NotFoundOnTable {
                            table: table.clone(),
                            name: field.name.clone(),
                        });
                    }
                    _ => {
                        return Err(ResolutionError::Ambiguous {
                            name: display_reference(field),
                            candidates: on_table.iter().map(|m| m.source.to_string()).collect(),
                        });
                    }
                }
            }
        };
        Ok(field.with_type(matched.data_type.clone()))
    }
}

fn display_reference(field: &Field) -> String {
    match &field.table {
        Some(table) => format!("{table}.{}", field.name),
        None => field.name.clone(),
    }
}

/// Schema fields a star expands to
pub(crate) fn star_fields<'s>(star: &'s Star, schema: &'s Schema) -> Vec<&'s SchemaField> {
    match &star.table {
        Some(table) => schema.fields_from(table).collect(),
        None => schema.fields.iter().collect(),
    }
}

fn resolve_star(star: &Star, schema: &Schema) -> Star {
    let types = star_fields(star, schema)
        .into_iter()
        .map(|field| field.data_type.clone())
        .collect();
    star.with_type(row(types))
}

impl Resolver {
    /// Resolve one expression against `schema`
    pub(crate) fn value(&mut self, value: &Value, schema: &Schema) -> ResolutionResult<Value> {
        FieldResolver {
            resolver: self,
            schema,
        }
        .resolve_value(value)
    }

    /// Resolve a clause node (ORDER BY term, GROUP BY, window) against `schema`
    pub(crate) fn children<T: Resolvable>(&mut self, node: &T, schema: &Schema) -> ResolutionResult<T> {
        node.with_resolved_children(&mut FieldResolver {
            resolver: self,
            schema,
        })
    }

    pub(crate) fn values(&mut self, values: &[Value], schema: &Schema) -> ResolutionResult<Vec<Value>> {
        values.iter().map(|value| self.value(value, schema)).collect()
    }
}
