//! `find_all` query construction.
//!
//! Turns a [`PaginationQuery`] into a SeaORM `Select`: default-plus-override
//! pagination, allow-listed sorting, allow-listed substring filters,
//! relation-based EXISTS sub-queries and an optional column projection.

use std::marker::PhantomData;

use sea_orm::sea_query::{Alias, Expr, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, Order, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Select,
};
use serde_json::Value as JsonValue;

use super::contains_ci;
use super::dto::{PaginationQuery, SortOrder};
use crate::config::{ConfigService, PaginationConfig, CONFIG_NAMESPACE};
use crate::constants::ID_COLUMN;
use crate::error::{translate, CrudError};
use crate::schema::{CrudTable, FindAllOptions, RelationOptions, SchemaRegistry, TableDescriptor};

/// Everything the query builder reads from its owning repository
pub struct QueryBuilderDeps<'a> {
    pub schema: &'a SchemaRegistry,
    pub options: &'a FindAllOptions,
    pub allowed_sort_columns: &'a [String],
    pub allowed_filter_columns: &'a [String],
    pub config: &'a dyn ConfigService,
    pub filter_query: &'a PaginationQuery,
}

/// Builds and runs the `find_all` query for entity `E`
pub struct BaseQueryBuilder<'a, E: CrudTable> {
    deps: QueryBuilderDeps<'a>,
    _entity: PhantomData<E>,
}

impl<'a, E: CrudTable> BaseQueryBuilder<'a, E> {
    pub fn new(deps: QueryBuilderDeps<'a>) -> Self {
        Self {
            deps,
            _entity: PhantomData,
        }
    }

    /// Resolve the table a relation points at.
    ///
    /// An explicit `table_name` must name a registered table; otherwise the
    /// relation name itself is looked up.
    pub fn resolve_related_table(&self, relation_name: &str, cfg: Option<&RelationOptions>) -> Option<&'a TableDescriptor> {
        match cfg.and_then(|c| c.table_name.as_deref()) {
            Some(key) => self.deps.schema.get(key),
            None => self.deps.schema.get(relation_name),
        }
    }

    /// Effective `(limit, offset)`: the query's values, else configured defaults
    pub fn pagination(&self) -> (u64, u64) {
        let config = self.deps.config;
        let default_limit = config.get_or(&format!("{}.limit", CONFIG_NAMESPACE), PaginationConfig::default().limit);
        let default_offset =
            config.get_or(&format!("{}.offset", CONFIG_NAMESPACE), PaginationConfig::default().offset);

        let query = self.deps.filter_query;
        let limit = query.limit.and_then(|l| u64::try_from(l).ok()).unwrap_or(default_limit);
        let offset = query.offset.and_then(|o| u64::try_from(o).ok()).unwrap_or(default_offset);
        (limit, offset)
    }

    /// Sort column and direction; non-allow-listed or unknown columns fall back to `id`
    pub fn sort(&self) -> Option<(E::Column, Order)> {
        let query = self.deps.filter_query;
        let sort_by = query
            .sort_by
            .as_deref()
            .filter(|name| self.deps.allowed_sort_columns.iter().any(|allowed| allowed == name))
            .unwrap_or(ID_COLUMN);

        let column = E::column(sort_by).or_else(E::id_column)?;
        let order = match query.order {
            Some(SortOrder::Desc) => Order::Desc,
            _ => Order::Asc,
        };
        Some((column, order))
    }

    /// WHERE conditions: soft-delete exclusion, column filters, relation filters
    pub fn conditions(&self) -> Condition {
        let mut conditions = Condition::all();

        if let Some(deleted_at) = E::deleted_at_column() {
            conditions = conditions.add(deleted_at.is_null());
        }

        for key in self.deps.allowed_filter_columns {
            let Some(value) = self.deps.filter_query.search_value(key) else {
                continue;
            };
            match E::column(key) {
                Some(column) => conditions = conditions.add(contains_ci(Expr::col((E::default(), column)), value)),
                None => log::warn!("Filter column '{}' does not exist on {}", key, E::sql_table_name()),
            }
        }

        for condition in self.relation_conditions() {
            conditions = conditions.add(condition);
        }

        conditions
    }

    fn relation_conditions(&self) -> Vec<SimpleExpr> {
        let base = TableDescriptor::of::<E>();
        let mut conditions = Vec::new();

        for (relation_name, cfg) in &self.deps.options.relations {
            let Some(related) = self.resolve_related_table(relation_name, Some(cfg)) else {
                log::warn!("Relation '{}' does not resolve to a registered table, skipping", relation_name);
                continue;
            };

            let fk = cfg
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}_{}", relation_name, ID_COLUMN));

            for column in &cfg.searchable_columns {
                let param_name = format!("{}_{}", relation_name, column);
                let Some(search_value) = self.deps.filter_query.search_value(&param_name) else {
                    continue;
                };
                let Some(related_column) = related.column(column) else {
                    continue;
                };
                let Some(join) = join_condition(&base, related, &fk) else {
                    log::warn!(
                        "Relation '{}': foreign key '{}' found on neither {} nor {}",
                        relation_name,
                        fk,
                        base.name,
                        related.name
                    );
                    continue;
                };

                let subquery = Query::select()
                    .expr(Expr::val(1))
                    .from(Alias::new(&related.name))
                    .and_where(join)
                    .and_where(contains_ci(
                        Expr::col((Alias::new(&related.name), Alias::new(related_column))),
                        search_value,
                    ))
                    .to_owned();

                conditions.push(Expr::exists(subquery));
            }
        }

        conditions
    }

    /// The complete, unexecuted query
    pub fn build(&self) -> Select<E> {
        let (limit, offset) = self.pagination();

        let mut select = E::find().filter(self.conditions());
        if let Some((column, order)) = self.sort() {
            select = select.order_by(column, order);
        }
        select.limit(limit).offset(offset)
    }

    /// Run the query and return full rows
    pub async fn execute<C>(&self, conn: &C) -> crate::Result<Vec<E::Model>>
    where
        C: ConnectionTrait,
    {
        let select = self.build();
        log::debug!("find_all: {}", select.build(conn.get_database_backend()));
        select.all(conn).await.map_err(|e| translate(CrudError::from(e)))
    }

    /// Run the query returning only the configured `selected_columns`, as JSON rows.
    ///
    /// Unknown column names are ignored; when none remain every column is returned.
    pub async fn execute_projected<C>(&self, conn: &C) -> crate::Result<Vec<JsonValue>>
    where
        C: ConnectionTrait,
    {
        let mut select = self.build();

        let columns: Vec<E::Column> = self
            .deps
            .options
            .selected_columns
            .iter()
            .flatten()
            .filter_map(|name| E::column(name))
            .collect();

        if !columns.is_empty() {
            select = select.select_only().columns(columns);
        }

        log::debug!("find_all (projected): {}", select.build(conn.get_database_backend()));
        select
            .into_json()
            .all(conn)
            .await
            .map_err(|e| translate(CrudError::from(e)))
    }
}

/// Join between the base table and a related table over `fk`.
///
/// A foreign key living only on the base table points at `related.id`; one
/// living on the related table points back at `base.id`.
fn join_condition(base: &TableDescriptor, related: &TableDescriptor, fk: &str) -> Option<SimpleExpr> {
    let base_table = Alias::new(&base.name);
    let related_table = Alias::new(&related.name);

    match (base.column(fk), related.column(fk)) {
        (Some(base_fk), None) => {
            let related_id = related.column(ID_COLUMN)?;
            Some(
                Expr::col((base_table, Alias::new(base_fk)))
                    .equals((related_table, Alias::new(related_id))),
            )
        }
        (_, Some(related_fk)) => {
            let base_id = base.column(ID_COLUMN)?;
            Some(
                Expr::col((base_table, Alias::new(base_id)))
                    .equals((related_table, Alias::new(related_fk))),
            )
        }
        (None, None) => None,
    }
}
