//! Resolution context

use crate::{ResolutionError, ResolutionResult, Schema};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use sqlweave_ast::{Relation, Value};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Knobs for a resolution run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Fail when a column reference matches nothing in scope
    pub deny_unresolved: bool,
    /// Deepest relation nesting accepted
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            deny_unresolved: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A rebuilt tree together with the schema it produces
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub node: T,
    pub schema: Schema,
}

impl<T> Resolved<T> {
    pub fn new(node: T, schema: Schema) -> Self {
        Self { node, schema }
    }

    pub fn into_node(self) -> T {
        self.node
    }
}

/// Resolves column references in relation and expression trees
///
/// Resolution never mutates its input: every entry point returns a rebuilt
/// tree. The schema each base table resolved to is recorded and can be read
/// back with [`Resolver::table_schema`].
///
/// Base tables are looked up in the ambient schema first, so CTEs shadow
/// tables of the same name, then in the catalog. Unlike the ambient schema,
/// the catalog stays visible inside subqueries.
#[derive(Debug, Default)]
pub struct Resolver {
    options: ResolveOptions,
    catalog: Schema,
    tables: IndexMap<String, Schema>,
    pub(crate) depth: usize,
    pub(crate) unresolved: Vec<String>,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Declare the columns of known base tables
    pub fn with_catalog(mut self, catalog: Schema) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Schema {
        &self.catalog
    }

    /// Schema a base table resolved to during the last run
    ///
    /// Tables are keyed by name, so when one run reads two tables of the same
    /// name (a CTE in one subquery, a catalog table in another) the later
    /// read wins.
    pub fn table_schema(&self, name: &str) -> Option<&Schema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.tables.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub(crate) fn record_table(&mut self, name: &str, schema: &Schema) {
        self.tables.insert(name.to_string(), schema.clone());
    }

    /// Resolve a relation with nothing in scope
    pub fn resolve_relation(&mut self, relation: &Relation) -> ResolutionResult<Resolved<Relation>> {
        self.resolve_relation_in(relation, &Schema::empty())
    }

    /// Resolve a relation against an ambient schema, typically the known base tables
    pub fn resolve_relation_in(
        &mut self,
        relation: &Relation,
        ambient: &Schema,
    ) -> ResolutionResult<Resolved<Relation>> {
        self.begin();
        let (node, schema) = self.relation(relation, ambient)?;
        self.finish()?;
        Ok(Resolved::new(node, schema))
    }

    /// Resolve the column references of one expression
    pub fn resolve_value(&mut self, value: &Value, schema: &Schema) -> ResolutionResult<Value> {
        self.begin();
        let value = self.value(value, schema)?;
        self.finish()?;
        Ok(value)
    }

    fn begin(&mut self) {
        self.depth = 0;
        self.unresolved.clear();
        self.tables.clear();
    }

    fn finish(&mut self) -> ResolutionResult<()> {
        if self.unresolved.is_empty() {
            return Ok(());
        }
        let names = std::mem::take(&mut self.unresolved);
        warn!("{} column references left unresolved: {}", names.len(), names.join(", "));
        if self.options.deny_unresolved {
            return Err(ResolutionError::Unresolved { names });
        }
        Ok(())
    }
}

/// Resolve the column references of `value` against `schema`
///
/// References that match nothing keep their UNKNOWN type. Subqueries
/// nested in the expression are resolved in their own scope.
pub fn resolve_fields(value: &Value, schema: &Schema) -> ResolutionResult<Value> {
    Resolver::default().resolve_value(value, schema)
}

/// `relation.resolve(ambient)`, with default options
pub trait Resolve {
    fn resolve(&self, ambient: &Schema) -> ResolutionResult<Resolved<Relation>>;
}

impl Resolve for Relation {
    fn resolve(&self, ambient: &Schema) -> ResolutionResult<Resolved<Relation>> {
        Resolver::default().resolve_relation_in(self, ambient)
    }
}
