//! Table metadata shared by the repository, query builder and CRUD factory.
//!
//! SeaORM entities describe their columns statically. The helpers here expose
//! that description by column *name*, which is what allow-lists, filter DTOs
//! and relation configuration work with.

use crate::error::CrudError;
use sea_orm::{EntityTrait, IdenStatic, Iterable, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use crate::constants::{DELETED_AT_COLUMN, ID_COLUMN, UPDATED_AT_COLUMN};

/// Primary key values accepted by CRUD operations
pub trait RecordId: Into<Value> + Clone + Display + Send + Sync {}

impl<T> RecordId for T where T: Into<Value> + Clone + Display + Send + Sync {}

/// Per-table metadata for an entity managed by this crate.
///
/// Every method has a default based on column naming conventions, so most
/// entities opt in with an empty impl:
///
/// ```rust,ignore
/// impl sea_crud::CrudTable for user::Entity {}
/// ```
pub trait CrudTable: EntityTrait {
    /// Resolve a column by its database name or its camelCase spelling
    fn column(name: &str) -> Option<Self::Column> {
        Self::Column::iter().find(|column| names_match(column.as_str(), name))
    }

    fn has_column(name: &str) -> bool {
        Self::column(name).is_some()
    }

    /// Primary key column used by id-based operations
    fn id_column() -> Option<Self::Column> {
        Self::column(ID_COLUMN)
    }

    /// Soft-delete marker; tables without it do not support soft delete
    fn deleted_at_column() -> Option<Self::Column> {
        Self::column(DELETED_AT_COLUMN)
    }

    fn updated_at_column() -> Option<Self::Column> {
        Self::column(UPDATED_AT_COLUMN)
    }

    /// Value written into `updated_at` / `deleted_at`
    fn timestamp_now() -> Value {
        chrono::Utc::now().into()
    }

    fn sql_table_name() -> String {
        Self::default().table_name().to_string()
    }
}

/// Id column or an error naming the table
pub(crate) fn require_id_column<E: CrudTable>() -> crate::Result<E::Column> {
    E::id_column().ok_or_else(|| {
        CrudError::Unsupported(format!("Table {} does not have an \"id\" column.", E::sql_table_name()))
    })
}

/// Runtime description of a table: its name and column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Describe a SeaORM entity
    pub fn of<E: EntityTrait>() -> Self {
        Self {
            name: E::default().table_name().to_string(),
            columns: E::Column::iter().map(|c| c.as_str().to_string()).collect(),
        }
    }

    /// Database name of a column, accepting the camelCase spelling too
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| names_match(column, name))
            .map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Tables a repository may reach through relation filters, keyed by the name
/// relations refer to them by
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableDescriptor>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity under its table name
    pub fn register<E: EntityTrait>(self) -> crate::Result<Self> {
        let key = E::default().table_name().to_string();
        self.register_as::<E>(&key)
    }

    /// Register an entity under an explicit key
    pub fn register_as<E: EntityTrait>(self, key: &str) -> crate::Result<Self> {
        self.insert(key, TableDescriptor::of::<E>())
    }

    /// Register a table descriptor directly
    pub fn insert(mut self, key: &str, table: TableDescriptor) -> crate::Result<Self> {
        if self.tables.contains_key(key) {
            return Err(CrudError::Config(format!("Table '{}' is already registered", key)));
        }
        self.tables.insert(key.to_string(), table);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&TableDescriptor> {
        self.tables.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tables.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Configuration for a relation used by relation-based filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationOptions {
    /// Registry key of the related table; defaults to the relation name
    pub table_name: Option<String>,
    /// Join column; defaults to `{relation}_id`
    pub foreign_key: Option<String>,
    /// Related columns searchable through `{relation}_{column}` parameters
    pub searchable_columns: Vec<String>,
}

impl RelationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    pub fn searchable_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.searchable_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Options controlling `find_all`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindAllOptions {
    pub relations: BTreeMap<String, RelationOptions>,
    /// Columns to project in `execute_projected`; `None` selects every column
    pub selected_columns: Option<Vec<String>>,
}

impl FindAllOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(mut self, name: impl Into<String>, options: RelationOptions) -> Self {
        self.relations.insert(name.into(), options);
        self
    }

    pub fn select_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selected_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

fn names_match(column: &str, requested: &str) -> bool {
    column == requested || to_camel_case(column) == requested
}

/// `deleted_at` -> `deletedAt`
pub(crate) fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
