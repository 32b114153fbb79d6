//! Pluggable input validation.
//!
//! The crate ships no validation rules of its own. Callers plug in a
//! [`ValidationAdapter`] backed by whatever validator they use; every method
//! defaults to passing input through untouched.

use async_trait::async_trait;
use serde::Serialize;

use super::params::ListParams;
use crate::Result;

/// What a list validator needs to know about the table's list surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchemaOptions {
    pub search_fields: Vec<String>,
    pub allowed_filters: Vec<String>,
    pub default_limit: u64,
    pub max_limit: u64,
    /// Only tables with soft delete may be listed with `include_deleted`
    pub allow_include_deleted: bool,
}

/// Validates (and may transform) input before it reaches the database.
///
/// Return [`CrudError::Validation`](crate::CrudError::Validation) to reject
/// input.
#[async_trait]
pub trait ValidationAdapter<A: Send + 'static>: Send + Sync {
    async fn validate_insert(&self, data: A) -> Result<A> {
        Ok(data)
    }

    async fn validate_update(&self, data: A) -> Result<A> {
        Ok(data)
    }

    async fn validate_list(&self, params: ListParams, _options: &ListSchemaOptions) -> Result<ListParams> {
        Ok(params)
    }
}
