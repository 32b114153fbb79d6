use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Who is performing an operation; handed to scope filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: JsonValue,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, flatten)]
    pub attributes: BTreeMap<String, JsonValue>,
}

impl Actor {
    pub fn new(id: impl Into<JsonValue>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Per-call context for [`Crud`](super::Crud) operations
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub actor: Option<Actor>,
    /// Values for the configured scope filters, keyed by filter name
    pub scope: BTreeMap<String, JsonValue>,
    pub skip_validation: bool,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn scope(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.scope.insert(key.into(), value.into());
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }
}

/// The operation a validation decision is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudOperation {
    Create,
    BulkCreate,
    List,
    Update,
}
