use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sea_orm::{Condition, Value};
use serde_json::Value as JsonValue;

use super::context::{Actor, CrudOperation, OperationContext};
use super::validation::ValidationAdapter;

/// Builds an extra condition from a scope value and the acting user.
///
/// Returning `None` leaves the query unrestricted by this filter.
pub type ScopeFilter = Box<dyn Fn(Option<&JsonValue>, Option<&Actor>) -> Option<Condition> + Send + Sync>;

pub type TransformHook<A> = Box<dyn Fn(A) -> A + Send + Sync>;

pub type ValidateHook = Box<dyn Fn(CrudOperation, &OperationContext) -> bool + Send + Sync>;

/// Soft-delete column and the values that mark a row deleted or live
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDeleteConfig {
    pub field: String,
    /// Written on delete; defaults to the current timestamp
    pub deleted_value: Option<Value>,
    /// Written on restore and matched when filtering; defaults to NULL
    pub not_deleted_value: Option<Value>,
}

impl SoftDeleteConfig {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            deleted_value: None,
            not_deleted_value: None,
        }
    }

    pub fn deleted_value(mut self, value: impl Into<Value>) -> Self {
        self.deleted_value = Some(value.into());
        self
    }

    pub fn not_deleted_value(mut self, value: impl Into<Value>) -> Self {
        self.not_deleted_value = Some(value.into());
        self
    }
}

/// Optional callbacks run around writes
pub struct Hooks<A> {
    pub before_create: Option<TransformHook<A>>,
    pub before_update: Option<TransformHook<A>>,
    /// Decides whether validation runs; by default it does unless the
    /// context sets `skip_validation`
    pub validate: Option<ValidateHook>,
}

impl<A> Default for Hooks<A> {
    fn default() -> Self {
        Self {
            before_create: None,
            before_update: None,
            validate: None,
        }
    }
}

impl<A> Hooks<A> {
    pub(crate) fn should_validate(&self, operation: CrudOperation, context: &OperationContext) -> bool {
        match &self.validate {
            Some(hook) => hook(operation, context),
            None => !context.skip_validation,
        }
    }
}

/// Configuration of a [`Crud`](super::Crud) instance.
///
/// `A` is the table's active model, the unit of create and update input.
pub struct CrudOptions<A: Send + 'static> {
    pub search_fields: Vec<String>,
    /// Falls back to the factory default (20)
    pub default_limit: Option<u64>,
    /// Falls back to the factory default (100)
    pub max_limit: Option<u64>,
    /// Columns structured filters may reference; empty allows every column
    pub allowed_filters: Vec<String>,
    pub soft_delete: Option<SoftDeleteConfig>,
    pub scope_filters: BTreeMap<String, ScopeFilter>,
    pub hooks: Hooks<A>,
    pub validation: Option<Arc<dyn ValidationAdapter<A>>>,
}

impl<A: Send + 'static> Default for CrudOptions<A> {
    fn default() -> Self {
        Self {
            search_fields: Vec::new(),
            default_limit: None,
            max_limit: None,
            allowed_filters: Vec::new(),
            soft_delete: None,
            scope_filters: BTreeMap::new(),
            hooks: Hooks::default(),
            validation: None,
        }
    }
}

impl<A: Send + 'static> CrudOptions<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_limit(mut self, limit: u64) -> Self {
        self.default_limit = Some(limit);
        self
    }

    pub fn max_limit(mut self, limit: u64) -> Self {
        self.max_limit = Some(limit);
        self
    }

    pub fn allowed_filters(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_filters = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn soft_delete(mut self, config: SoftDeleteConfig) -> Self {
        self.soft_delete = Some(config);
        self
    }

    pub fn scope_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(Option<&JsonValue>, Option<&Actor>) -> Option<Condition> + Send + Sync + 'static,
    {
        self.scope_filters.insert(name.into(), Box::new(filter));
        self
    }

    pub fn before_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(A) -> A + Send + Sync + 'static,
    {
        self.hooks.before_create = Some(Box::new(hook));
        self
    }

    pub fn before_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(A) -> A + Send + Sync + 'static,
    {
        self.hooks.before_update = Some(Box::new(hook));
        self
    }

    pub fn validate_when<F>(mut self, hook: F) -> Self
    where
        F: Fn(CrudOperation, &OperationContext) -> bool + Send + Sync + 'static,
    {
        self.hooks.validate = Some(Box::new(hook));
        self
    }

    pub fn validation(mut self, adapter: impl ValidationAdapter<A> + 'static) -> Self {
        self.validation = Some(Arc::new(adapter));
        self
    }
}

impl<A: Send + 'static> fmt::Debug for CrudOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudOptions")
            .field("search_fields", &self.search_fields)
            .field("default_limit", &self.default_limit)
            .field("max_limit", &self.max_limit)
            .field("allowed_filters", &self.allowed_filters)
            .field("soft_delete", &self.soft_delete)
            .field("scope_filters", &self.scope_filters.keys().collect::<Vec<_>>())
            .field("has_validation", &self.validation.is_some())
            .finish()
    }
}
