//! Functional CRUD surface.
//!
//! Where [`CrudRepository`](crate::repositories::CrudRepository) is a fixed
//! set of repository operations, [`Crud`] is assembled from [`CrudOptions`]:
//! search fields, structured filter allow-lists, scope filters evaluated
//! against the acting user, write hooks, a pluggable validator and a
//! configurable soft-delete column.
//!
//! ```rust,ignore
//! let users = crud_factory::<user::Entity, user::ActiveModel>(
//!     CrudOptions::new()
//!         .search_fields(["name", "email"])
//!         .soft_delete(SoftDeleteConfig::new("deleted_at")),
//! )?;
//! let page = users.list(&db, ListParams::new().search("ada"), &OperationContext::new()).await?;
//! ```

mod context;
mod options;
mod params;
mod validation;

pub use context::{Actor, CrudOperation, OperationContext};
pub use options::{CrudOptions, Hooks, ScopeFilter, SoftDeleteConfig, TransformHook, ValidateHook};
pub use params::{BulkResult, FindByIdParams, ListParams, ListResult, OperationResult, OrderBy};
pub use validation::{ListSchemaOptions, ValidationAdapter};

use std::marker::PhantomData;

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Value,
};
use serde_json::Value as JsonValue;

use crate::config::ListingConfig;
use crate::constants::{DEFAULT_LIST_LIMIT, DEFAULT_MAX_LIST_LIMIT};
use crate::error::{translate, CrudError, Result};
use crate::query::{contains_ci, filters_to_condition};
use crate::schema::{require_id_column, CrudTable, RecordId};
use crate::value;

/// Global defaults applied to every table built through it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudFactory {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for CrudFactory {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIST_LIMIT,
            max_limit: DEFAULT_MAX_LIST_LIMIT,
        }
    }
}

impl CrudFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(listing: &ListingConfig) -> Self {
        Self {
            default_limit: listing.default_limit,
            max_limit: listing.max_limit,
        }
    }

    pub fn default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn max_limit(mut self, limit: u64) -> Self {
        self.max_limit = limit;
        self
    }

    /// Build the CRUD operations for one table.
    ///
    /// Limits missing from `options` take the factory's values. Fails when a
    /// configured soft-delete field is not a column of `E`.
    pub fn for_table<E, A>(&self, mut options: CrudOptions<A>) -> Result<Crud<E, A>>
    where
        E: CrudTable,
        A: ActiveModelTrait<Entity = E> + Send + 'static,
    {
        options.default_limit.get_or_insert(self.default_limit);
        options.max_limit.get_or_insert(self.max_limit);
        Crud::new(options)
    }
}

/// Build the CRUD operations for table `E` with the package defaults
pub fn crud_factory<E, A>(options: CrudOptions<A>) -> Result<Crud<E, A>>
where
    E: CrudTable,
    A: ActiveModelTrait<Entity = E> + Send + 'static,
{
    CrudFactory::default().for_table(options)
}

/// CRUD operations for table `E`, taking `A` as write input
pub struct Crud<E, A>
where
    E: CrudTable,
    A: ActiveModelTrait<Entity = E> + Send + 'static,
{
    options: CrudOptions<A>,
    default_limit: u64,
    max_limit: u64,
    soft_delete_column: Option<E::Column>,
    _entity: PhantomData<E>,
}

impl<E, A> Crud<E, A>
where
    E: CrudTable,
    A: ActiveModelTrait<Entity = E> + Send + 'static,
{
    fn new(options: CrudOptions<A>) -> Result<Self> {
        let soft_delete_column = match &options.soft_delete {
            Some(config) => Some(E::column(&config.field).ok_or_else(|| {
                CrudError::Config(format!(
                    "Soft delete field '{}' is not a column of {}",
                    config.field,
                    E::sql_table_name()
                ))
            })?),
            None => None,
        };

        let default_limit = options.default_limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let max_limit = options.max_limit.unwrap_or(DEFAULT_MAX_LIST_LIMIT);

        Ok(Self {
            options,
            default_limit,
            max_limit,
            soft_delete_column,
            _entity: PhantomData,
        })
    }

    pub fn options(&self) -> &CrudOptions<A> {
        &self.options
    }

    /// What a list validator is told about this table
    pub fn list_schema_options(&self) -> ListSchemaOptions {
        ListSchemaOptions {
            search_fields: self.options.search_fields.clone(),
            allowed_filters: self.options.allowed_filters.clone(),
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            allow_include_deleted: self.options.soft_delete.is_some(),
        }
    }

    /// `(limit, page, offset)` for a list request
    pub fn page_bounds(&self, params: &ListParams) -> (u64, u64, u64) {
        let limit = params
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        let page = params.page.filter(|p| *p > 0).unwrap_or(1);
        (limit, page, (page - 1).saturating_mul(limit))
    }

    fn scope_condition(&self, context: &OperationContext) -> Condition {
        let mut condition = Condition::all();
        for (name, filter) in &self.options.scope_filters {
            if let Some(scoped) = filter(context.scope.get(name), context.actor.as_ref()) {
                condition = condition.add(scoped);
            }
        }
        condition
    }

    /// Rows not marked deleted; `None` without soft delete
    fn live_condition(&self) -> Option<SimpleExpr> {
        let column = self.soft_delete_column?;
        match self.not_deleted_value() {
            Some(value) => Some(column.eq(value)),
            None => Some(column.is_null()),
        }
    }

    fn not_deleted_value(&self) -> Option<Value> {
        self.options
            .soft_delete
            .as_ref()
            .and_then(|config| config.not_deleted_value.clone())
            .filter(|value| !value::is_null(value))
    }

    fn deleted_expr(&self) -> SimpleExpr {
        let value = self
            .options
            .soft_delete
            .as_ref()
            .and_then(|config| config.deleted_value.clone())
            .unwrap_or_else(E::timestamp_now);
        SimpleExpr::Value(value)
    }

    fn not_deleted_expr(&self) -> SimpleExpr {
        match self.not_deleted_value() {
            Some(value) => SimpleExpr::Value(value),
            None => Expr::cust("NULL"),
        }
    }

    fn id_condition<I: RecordId>(&self, id: I, context: &OperationContext) -> Result<Condition> {
        let id_column = require_id_column::<E>()?;
        Ok(Condition::all().add(id_column.eq(id)).add(self.scope_condition(context)))
    }

    fn ids_condition<I: RecordId>(&self, ids: &[I], context: &OperationContext) -> Result<Condition> {
        let id_column = require_id_column::<E>()?;
        Ok(Condition::all()
            .add(id_column.is_in(ids.iter().cloned()))
            .add(self.scope_condition(context)))
    }

    fn search_condition(&self, search: Option<&str>) -> Option<Condition> {
        let search = search.map(str::trim).filter(|s| !s.is_empty())?;
        if self.options.search_fields.is_empty() {
            return None;
        }

        let mut any = Condition::any();
        for field in &self.options.search_fields {
            match E::column(field) {
                Some(column) => any = any.add(contains_ci(Expr::col((E::default(), column)), search)),
                None => log::warn!("Search field '{}' is not a column of {}", field, E::sql_table_name()),
            }
        }
        Some(any)
    }

    /// All WHERE conditions of a list request
    pub fn list_condition(&self, params: &ListParams, context: &OperationContext) -> Result<Condition> {
        let mut condition = Condition::all();

        if let Some(extra) = &params.condition {
            condition = condition.add(extra.clone());
        }
        if let Some(filters) = &params.filters {
            condition = condition.add(filters_to_condition::<E>(filters, &self.options.allowed_filters)?);
        }
        if let Some(search) = self.search_condition(params.search.as_deref()) {
            condition = condition.add(search);
        }
        condition = condition.add(self.scope_condition(context));
        if !params.include_deleted {
            if let Some(live) = self.live_condition() {
                condition = condition.add(live);
            }
        }

        Ok(condition)
    }

    async fn validate_insert(&self, operation: CrudOperation, data: A, context: &OperationContext) -> Result<A> {
        match &self.options.validation {
            Some(adapter) if self.options.hooks.should_validate(operation, context) => {
                adapter.validate_insert(data).await
            }
            _ => Ok(data),
        }
    }

    async fn prepare_create(&self, operation: CrudOperation, data: A, context: &OperationContext) -> Result<A> {
        let validated = self.validate_insert(operation, data, context).await?;
        Ok(match &self.options.hooks.before_create {
            Some(hook) => hook(validated),
            None => validated,
        })
    }

    /// Get a row by id within the caller's scope.
    ///
    /// Soft-deleted rows are returned only with `include_deleted`.
    pub async fn find_by_id<C, I>(
        &self,
        conn: &C,
        id: I,
        params: FindByIdParams,
        context: &OperationContext,
    ) -> Result<Option<E::Model>>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        E::find()
            .filter(self.find_condition(id, &params, context)?)
            .one(conn)
            .await
            .map_err(|e| translate(e.into()))
    }

    /// [`find_by_id`](Self::find_by_id) returning only `params.columns`.
    ///
    /// Unknown column names are dropped; with none left the whole row is
    /// returned.
    pub async fn find_by_id_projected<C, I>(
        &self,
        conn: &C,
        id: I,
        params: FindByIdParams,
        context: &OperationContext,
    ) -> Result<Option<JsonValue>>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let select = E::find().filter(self.find_condition(id, &params, context)?);
        project(select, params.columns.as_deref())
            .into_json()
            .one(conn)
            .await
            .map_err(|e| translate(e.into()))
    }

    fn find_condition<I: RecordId>(
        &self,
        id: I,
        params: &FindByIdParams,
        context: &OperationContext,
    ) -> Result<Condition> {
        let mut condition = self.id_condition(id, context)?;
        if !params.include_deleted {
            if let Some(live) = self.live_condition() {
                condition = condition.add(live);
            }
        }
        Ok(condition)
    }

    /// One page of rows with the total number of matching rows
    pub async fn list<C>(&self, conn: &C, params: ListParams, context: &OperationContext) -> Result<ListResult<E::Model>>
    where
        C: ConnectionTrait,
        E::Model: Sync,
    {
        let (select, limit, page, offset) = self.list_select(params, context).await?;
        let total = select.clone().count(conn).await.map_err(|e| translate(e.into()))?;
        let results = select
            .limit(limit)
            .offset(offset)
            .all(conn)
            .await
            .map_err(|e| translate(e.into()))?;

        Ok(self.page_of(results, total, limit, page))
    }

    /// [`list`](Self::list) returning only `params.columns` of each row
    pub async fn list_projected<C>(
        &self,
        conn: &C,
        params: ListParams,
        context: &OperationContext,
    ) -> Result<ListResult<JsonValue>>
    where
        C: ConnectionTrait,
        E::Model: Sync,
    {
        let columns = params.columns.clone();
        let (select, limit, page, offset) = self.list_select(params, context).await?;
        let total = select.clone().count(conn).await.map_err(|e| translate(e.into()))?;
        let results = project(select, columns.as_deref())
            .limit(limit)
            .offset(offset)
            .into_json()
            .all(conn)
            .await
            .map_err(|e| translate(e.into()))?;

        Ok(self.page_of(results, total, limit, page))
    }

    /// Validated, filtered and ordered select with its `(limit, page, offset)`
    async fn list_select(
        &self,
        params: ListParams,
        context: &OperationContext,
    ) -> Result<(Select<E>, u64, u64, u64)> {
        let params = match &self.options.validation {
            Some(adapter) if self.options.hooks.should_validate(CrudOperation::List, context) => {
                adapter.validate_list(params, &self.list_schema_options()).await?
            }
            _ => params,
        };

        let condition = self.list_condition(&params, context)?;
        let (limit, page, offset) = self.page_bounds(&params);

        let mut select = E::find().filter(condition);
        for order in &params.order_by {
            match E::column(&order.field) {
                Some(column) => select = select.order_by(column, Order::from(order.direction)),
                None => log::debug!("Ignoring order on unknown field '{}'", order.field),
            }
        }

        Ok((select, limit, page, offset))
    }

    fn page_of<M>(&self, results: Vec<M>, total: u64, limit: u64, page: u64) -> ListResult<M> {
        log::debug!(
            "Listed {} of {} row(s) from {} (page {}, limit {})",
            results.len(),
            total,
            E::sql_table_name(),
            page,
            limit
        );

        ListResult {
            results,
            page,
            limit,
            total,
        }
    }

    /// Update a live row within the caller's scope.
    ///
    /// Returns `None` when no row matched.
    pub async fn update<C, I>(&self, conn: &C, id: I, data: A, context: &OperationContext) -> Result<Option<E::Model>>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let validated = match &self.options.validation {
            Some(adapter) if self.options.hooks.should_validate(CrudOperation::Update, context) => {
                adapter.validate_update(data).await?
            }
            _ => data,
        };
        let transformed = match &self.options.hooks.before_update {
            Some(hook) => hook(validated),
            None => validated,
        };

        let mut condition = self.id_condition(id.clone(), context)?;
        if let Some(live) = self.live_condition() {
            condition = condition.add(live);
        }

        if !transformed.is_changed() {
            return E::find()
                .filter(condition)
                .one(conn)
                .await
                .map_err(|e| translate(e.into()));
        }

        let result = E::update_many()
            .set(transformed)
            .filter(condition)
            .exec(conn)
            .await
            .map_err(|e| translate(e.into()))?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        // The write may have moved the row out of the caller's scope
        E::find()
            .filter(require_id_column::<E>()?.eq(id))
            .one(conn)
            .await
            .map_err(|e| translate(e.into()))
    }

    /// Soft delete when configured, else hard delete
    pub async fn delete_one<C, I>(&self, conn: &C, id: I, context: &OperationContext) -> Result<OperationResult>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let condition = self.id_condition(id, context)?;

        self.delete_where(conn, condition).await?;
        Ok(OperationResult { success: true })
    }

    /// Clear the soft-delete marker; `success` reports whether a row matched
    pub async fn restore<C, I>(&self, conn: &C, id: I, context: &OperationContext) -> Result<OperationResult>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let column = self.require_soft_delete("Restore")?;
        let result = E::update_many()
            .col_expr(column, self.not_deleted_expr())
            .filter(self.id_condition(id, context)?)
            .exec(conn)
            .await
            .map_err(|e| translate(e.into()))?;

        Ok(OperationResult {
            success: result.rows_affected > 0,
        })
    }

    /// Hard delete regardless of soft-delete configuration
    pub async fn permanent_delete<C, I>(&self, conn: &C, id: I, context: &OperationContext) -> Result<OperationResult>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        E::delete_many()
            .filter(self.id_condition(id, context)?)
            .exec(conn)
            .await
            .map_err(|e| translate(e.into()))?;

        Ok(OperationResult { success: true })
    }

    /// Soft (or hard) delete many rows
    pub async fn bulk_delete<C, I>(&self, conn: &C, ids: &[I], context: &OperationContext) -> Result<BulkResult>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let condition = self.ids_condition(ids, context)?;

        let rows_affected = self.delete_where(conn, condition).await?;
        Ok(bulk_result(rows_affected, ids.len()))
    }

    /// Clear the soft-delete marker on many rows
    pub async fn bulk_restore<C, I>(&self, conn: &C, ids: &[I], context: &OperationContext) -> Result<BulkResult>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let column = self.require_soft_delete("Bulk restore")?;
        let result = E::update_many()
            .col_expr(column, self.not_deleted_expr())
            .filter(self.ids_condition(ids, context)?)
            .exec(conn)
            .await
            .map_err(|e| translate(e.into()))?;

        Ok(bulk_result(result.rows_affected, ids.len()))
    }

    /// Soft delete matching rows when configured, else hard delete them
    async fn delete_where<C>(&self, conn: &C, condition: Condition) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let rows_affected = match self.soft_delete_column {
            Some(column) => E::update_many()
                .col_expr(column, self.deleted_expr())
                .filter(condition)
                .exec(conn)
                .await
                .map(|r| r.rows_affected),
            None => E::delete_many()
                .filter(condition)
                .exec(conn)
                .await
                .map(|r| r.rows_affected),
        };
        rows_affected.map_err(|e| translate(e.into()))
    }

    fn require_soft_delete(&self, operation: &str) -> Result<E::Column> {
        self.soft_delete_column.ok_or_else(|| {
            CrudError::Unsupported(format!(
                "{} operation requires soft delete to be configured",
                operation
            ))
        })
    }
}

impl<E, A> Crud<E, A>
where
    E: CrudTable,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + 'static,
    E::Model: IntoActiveModel<A>,
{
    /// Validate, run `before_create`, insert and return the row
    pub async fn create<C>(&self, conn: &C, data: A, context: &OperationContext) -> Result<E::Model>
    where
        C: ConnectionTrait,
    {
        let prepared = self.prepare_create(CrudOperation::Create, data, context).await?;
        let created = E::insert(prepared)
            .exec_with_returning(conn)
            .await
            .map_err(|e| translate(e.into()))?;
        log::debug!("Created row in {}", E::sql_table_name());
        Ok(created)
    }

    /// Validate and transform every item, then insert them in one statement
    pub async fn bulk_create<C>(&self, conn: &C, data: Vec<A>, context: &OperationContext) -> Result<BulkResult>
    where
        C: ConnectionTrait,
    {
        let mut prepared = Vec::with_capacity(data.len());
        for item in data {
            prepared.push(self.prepare_create(CrudOperation::BulkCreate, item, context).await?);
        }

        let count = prepared.len() as u64;
        if count > 0 {
            E::insert_many(prepared)
                .exec(conn)
                .await
                .map_err(|e| translate(e.into()))?;
        }
        log::debug!("Bulk-created {} row(s) in {}", count, E::sql_table_name());

        Ok(BulkResult { success: true, count })
    }
}

/// Restrict `select` to the named columns; unknown names are dropped
fn project<E: CrudTable>(select: Select<E>, columns: Option<&[String]>) -> Select<E> {
    let columns: Vec<E::Column> = columns.into_iter().flatten().filter_map(|name| E::column(name)).collect();
    if columns.is_empty() {
        select
    } else {
        select.select_only().columns(columns)
    }
}

/// Rows affected, or the number of ids asked for when the driver reports none
fn bulk_result(rows_affected: u64, requested: usize) -> BulkResult {
    BulkResult {
        success: true,
        count: if rows_affected > 0 {
            rows_affected
        } else {
            requested as u64
        },
    }
}
