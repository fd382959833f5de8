//! Output schemas of relations
//!
//! A [`Schema`] is the ordered list of columns a relation makes visible,
//! each tagged with the relation it came from, together with the names of
//! the relations bound in scope. A relation can be in scope without
//! contributing columns: a base table whose columns are not known still
//! binds its name.

use indexmap::IndexSet;
use sqlweave_ast::RelationKind;
use sqlweave_types::DataType;
use std::fmt;

/// Relation a schema field belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// A table, CTE or aliased relation; qualified references match on this name
    Named(String),
    /// A relation with no name, such as a subquery or UNNEST
    Anonymous(RelationKind),
}

impl Source {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Source::Named(name) => Some(name),
            Source::Anonymous(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Named(name) => f.write_str(name),
            Source::Anonymous(kind) => write!(f, "<{kind}>"),
        }
    }
}

/// A column of a [`Schema`]
///
/// Columns without a name are still part of the output, e.g. `SUM(x)` with
/// no alias, but nothing can refer to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaField {
    pub name: Option<String>,
    pub source: Source,
    pub data_type: DataType,
}

impl SchemaField {
    pub fn new(name: Option<String>, source: Source, data_type: DataType) -> Self {
        Self {
            name,
            source,
            data_type,
        }
    }

    /// A named column of a named relation
    pub fn named(name: impl Into<String>, source: impl Into<String>, data_type: DataType) -> Self {
        Self::new(Some(name.into()), Source::Named(source.into()), data_type)
    }

    pub fn unnamed(source: Source, data_type: DataType) -> Self {
        Self::new(None, source, data_type)
    }

    pub fn is_from(&self, relation: &str) -> bool {
        self.source.identifier() == Some(relation)
    }

    /// Same column re-tagged to another relation
    pub fn resourced(&self, source: Source) -> Self {
        Self::new(self.name.clone(), source, self.data_type.clone())
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("_");
        write!(f, "{name}: {} ({})", self.data_type, self.source)
    }
}

/// Columns and relation names visible to a relation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
    pub relation_ids: IndexSet<String>,
}

impl Schema {
    pub fn new(fields: Vec<SchemaField>, relation_ids: IndexSet<String>) -> Self {
        Self {
            fields,
            relation_ids,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema of a base table with known columns
    ///
    /// ```
    /// use sqlweave_semantic::Schema;
    /// use sqlweave_types::builder::{bigint, varchar};
    ///
    /// let orders = Schema::table("orders", [("id", bigint()), ("note", varchar(None))]);
    /// assert_eq!(orders.len(), 2);
    /// assert!(orders.binds("orders"));
    /// ```
    pub fn table<N: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (N, DataType)>,
    ) -> Self {
        let name = name.into();
        let fields = columns
            .into_iter()
            .map(|(column, dtype)| SchemaField::named(column, name.clone(), dtype))
            .collect();
        Self::new(fields, IndexSet::from([name]))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.relation_ids.is_empty()
    }

    pub fn binds(&self, relation: &str) -> bool {
        self.relation_ids.contains(relation)
    }

    /// Fields contributed by one relation
    pub fn fields_from<'s>(&'s self, relation: &'s str) -> impl Iterator<Item = &'s SchemaField> {
        self.fields.iter().filter(move |field| field.is_from(relation))
    }

    pub fn fields_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s SchemaField> {
        self.fields
            .iter()
            .filter(move |field| field.name.as_deref() == Some(name))
    }

    pub fn data_types(&self) -> Vec<DataType> {
        self.fields.iter().map(|field| field.data_type.clone()).collect()
    }

    /// Fields of `other` are appended unless already present, relation names are unioned
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        for field in &other.fields {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        let mut relation_ids = self.relation_ids.clone();
        relation_ids.extend(other.relation_ids.iter().cloned());
        Schema::new(fields, relation_ids)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        if !self.relation_ids.is_empty() {
            let ids: Vec<&str> = self.relation_ids.iter().map(String::as_str).collect();
            write!(f, "in scope: {}", ids.join(", "))?;
        }
        Ok(())
    }
}
