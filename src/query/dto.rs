//! Filter/pagination request DTO consumed by [`BaseQueryBuilder`](super::BaseQueryBuilder).

use crate::error::CrudError;
use sea_orm::Order;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Pagination, sorting and free-form filter parameters of a list request.
///
/// Parameters that are not one of the four pagination fields are collected in
/// `params`; the query builder reads column filters (`name=...`) and relation
/// filters (`country_name=...`) from there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    #[serde(flatten)]
    pub params: BTreeMap<String, JsonValue>,
}

impl PaginationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>) -> Self {
        self.sort_by = Some(column.into());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Add a filter parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Trimmed value of a string parameter; `None` for missing, blank or
    /// non-string values
    pub fn search_value(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(JsonValue::String(value)) => Some(value.trim()).filter(|v| !v.is_empty()),
            _ => None,
        }
    }

    /// Check the pagination bounds: `limit` must be positive, `offset` must
    /// not be negative.
    pub fn validate(&self) -> crate::Result<()> {
        let mut problems = Vec::new();

        if let Some(limit) = self.limit {
            if limit <= 0 {
                problems.push(format!("limit must be a positive number, got {}", limit));
            }
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                problems.push(format!("offset must not be less than 0, got {}", offset));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CrudError::Validation(problems.join("; ")))
        }
    }
}
