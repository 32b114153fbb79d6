//! Generic per-table repository.
//!
//! [`CrudRepository`] is the class-style CRUD façade: list through the query
//! builder, find/create/update, soft delete with restore and purge, bulk
//! variants and a unique-field pre-check. Every operation takes the
//! connection it should run on, so the same repository works against a pool
//! or inside a caller's transaction.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, IntoActiveModel,
    ModelTrait, QueryFilter, TransactionTrait, Value,
};
use serde_json::Value as JsonValue;

use crate::config::{ConfigRegistry, ConfigService};
use crate::error::{translate, CrudError, Result};
use crate::query::{BaseQueryBuilder, PaginationQuery, QueryBuilderDeps};
use crate::schema::{require_id_column, CrudTable, FindAllOptions, RecordId, SchemaRegistry};
use crate::value;

/// Run a database operation, translating its failure.
///
/// Unique-constraint violations become [`CrudError::Conflict`], not-found
/// errors pass through, and any other database error becomes
/// [`CrudError::Internal`].
pub async fn safe_execute<T, F>(operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    operation.await.map_err(translate)
}

/// CRUD repository for entity `E`
pub struct CrudRepository<E: CrudTable> {
    schema: SchemaRegistry,
    options: FindAllOptions,
    allowed_sort_columns: Vec<String>,
    allowed_filter_columns: Vec<String>,
    config: Arc<dyn ConfigService>,
    _entity: PhantomData<E>,
}

impl<E: CrudTable> CrudRepository<E> {
    /// Repository reading pagination defaults from `config`
    pub fn new(config: Arc<dyn ConfigService>) -> Self {
        Self {
            schema: SchemaRegistry::new(),
            options: FindAllOptions::default(),
            allowed_sort_columns: Vec::new(),
            allowed_filter_columns: Vec::new(),
            config,
            _entity: PhantomData,
        }
    }

    /// Repository using the package pagination defaults
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(ConfigRegistry::new()))
    }

    /// Tables reachable through relation filters
    pub fn schema(mut self, schema: SchemaRegistry) -> Self {
        self.schema = schema;
        self
    }

    pub fn options(mut self, options: FindAllOptions) -> Self {
        self.options = options;
        self
    }

    pub fn allowed_sort_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_sort_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_filter_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_filter_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Query builder for a `find_all` request
    pub fn query_builder<'a>(&'a self, filter_query: &'a PaginationQuery) -> BaseQueryBuilder<'a, E> {
        BaseQueryBuilder::new(QueryBuilderDeps {
            schema: &self.schema,
            options: &self.options,
            allowed_sort_columns: &self.allowed_sort_columns,
            allowed_filter_columns: &self.allowed_filter_columns,
            config: self.config.as_ref(),
            filter_query,
        })
    }

    /// List non-deleted rows with pagination, sorting and filters
    pub async fn find_all<C>(&self, conn: &C, filter_query: &PaginationQuery) -> Result<Vec<E::Model>>
    where
        C: ConnectionTrait,
    {
        filter_query.validate()?;
        self.query_builder(filter_query).execute(conn).await
    }

    /// Like [`find_all`](Self::find_all), returning only the configured
    /// `selected_columns` as JSON rows
    pub async fn find_all_projected<C>(&self, conn: &C, filter_query: &PaginationQuery) -> Result<Vec<JsonValue>>
    where
        C: ConnectionTrait,
    {
        filter_query.validate()?;
        self.query_builder(filter_query).execute_projected(conn).await
    }

    /// Get a non-deleted row by id
    pub async fn find_one<C, I>(&self, conn: &C, id: I) -> Result<E::Model>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let id_column = require_id_column::<E>()?;
        safe_execute(async {
            let mut select = E::find().filter(id_column.eq(id.clone()));
            if let Some(deleted_at) = E::deleted_at_column() {
                select = select.filter(deleted_at.is_null());
            }
            select.one(conn).await?.ok_or_else(|| CrudError::not_found(&id))
        })
        .await
    }

    /// Row by id regardless of its soft-delete state
    async fn fetch<C, I>(&self, conn: &C, id: &I) -> Result<Option<E::Model>>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let id_column = require_id_column::<E>()?;
        Ok(E::find().filter(id_column.eq(id.clone())).one(conn).await?)
    }

    /// Fail with [`CrudError::Conflict`] when another row already holds the
    /// value `model` sets for any of `unique_fields`.
    ///
    /// Fields that are not set on the model, are NULL, or name no column are
    /// skipped. `exclude_id` leaves the row being updated out of the check.
    pub async fn check_unique_fields<C, A>(
        &self,
        conn: &C,
        model: &A,
        unique_fields: &[&str],
        exclude_id: Option<Value>,
    ) -> Result<()>
    where
        C: ConnectionTrait,
        A: ActiveModelTrait<Entity = E>,
    {
        for field in unique_fields {
            let Some(column) = E::column(field) else {
                continue;
            };
            let candidate = match model.get(column) {
                ActiveValue::Set(v) | ActiveValue::Unchanged(v) => v,
                ActiveValue::NotSet => continue,
            };
            if value::is_null(&candidate) {
                continue;
            }

            let mut select = E::find().filter(column.eq(candidate.clone()));
            if let (Some(excluded), Some(id_column)) = (&exclude_id, E::id_column()) {
                select = select.filter(id_column.ne(excluded.clone()));
            }

            if select.one(conn).await.map_err(|e| translate(e.into()))?.is_some() {
                return Err(CrudError::Conflict(format!(
                    "Entity with {} \"{}\" already exists.",
                    field,
                    value::display(&candidate)
                )));
            }
        }
        Ok(())
    }

    /// Insert a row, optionally checking `unique_fields` first
    pub async fn create<C, A>(&self, conn: &C, model: A, unique_fields: &[&str]) -> Result<E::Model>
    where
        C: ConnectionTrait,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        if !unique_fields.is_empty() {
            self.check_unique_fields(conn, &model, unique_fields, None).await?;
        }

        let created = safe_execute(async { Ok(E::insert(model).exec_with_returning(conn).await?) }).await?;
        log::debug!("Created row in {}", E::sql_table_name());
        Ok(created)
    }

    /// Update an existing row (deleted or not) and touch `updated_at`
    pub async fn update<C, I, A>(&self, conn: &C, id: I, model: A, unique_fields: &[&str]) -> Result<E::Model>
    where
        C: ConnectionTrait,
        I: RecordId,
        A: ActiveModelTrait<Entity = E> + Send,
    {
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            if self.fetch(conn, &id).await?.is_none() {
                return Err(CrudError::NotFound(format!("Entity with id {} not found", id)));
            }

            if !unique_fields.is_empty() {
                self.check_unique_fields(conn, &model, unique_fields, Some(id.clone().into()))
                    .await?;
            }

            if let Some(update) = update_with_timestamp::<E, A>(model) {
                update.filter(id_column.eq(id.clone())).exec(conn).await?;
            }

            self.fetch(conn, &id).await?.ok_or_else(|| CrudError::not_found(&id))
        })
        .await
    }

    /// Soft delete: set `deleted_at` and `updated_at`
    pub async fn remove<C, I>(&self, conn: &C, id: I) -> Result<E::Model>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let id_column = require_id_column::<E>()?;

        let mut assignments = Vec::new();
        if let Some(updated_at) = E::updated_at_column() {
            assignments.push((updated_at, now_expr::<E>()));
        }
        if let Some(deleted_at) = E::deleted_at_column() {
            assignments.push((deleted_at, now_expr::<E>()));
        }
        if assignments.is_empty() {
            return Err(CrudError::Unsupported(format!(
                "Table {} does not support soft delete.",
                E::sql_table_name()
            )));
        }

        safe_execute(async {
            let mut update = E::update_many().filter(id_column.eq(id.clone()));
            for (column, expr) in assignments {
                update = update.col_expr(column, expr);
            }

            if update.exec(conn).await?.rows_affected == 0 {
                return Err(CrudError::not_found(&id));
            }
            log::debug!("Soft-deleted {} {}", E::sql_table_name(), id);

            self.fetch(conn, &id).await?.ok_or_else(|| CrudError::not_found(&id))
        })
        .await
    }

    /// Hard delete a row that has already been soft-deleted
    pub async fn purge<C, I>(&self, conn: &C, id: I) -> Result<E::Model>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            let entity = self.fetch(conn, &id).await?.ok_or_else(|| CrudError::not_found(&id))?;

            let soft_deleted = E::deleted_at_column().is_some_and(|column| !value::is_null(&entity.get(column)));
            if !soft_deleted {
                return Err(CrudError::Forbidden(format!(
                    "Entity with ID {} must be soft-deleted before it can be purged.",
                    id
                )));
            }

            E::delete_many().filter(id_column.eq(id.clone())).exec(conn).await?;
            log::debug!("Purged {} {}", E::sql_table_name(), id);
            Ok(entity)
        })
        .await
    }

    /// Clear `deleted_at` on a soft-deleted row
    pub async fn restore<C, I>(&self, conn: &C, id: I) -> Result<E::Model>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            let entity = self.fetch(conn, &id).await?.ok_or_else(|| CrudError::not_found(&id))?;

            let Some(deleted_at) = E::deleted_at_column() else {
                return Err(CrudError::Forbidden(format!(
                    "Table {} does not support soft delete.",
                    E::sql_table_name()
                )));
            };

            if value::is_null(&entity.get(deleted_at)) {
                return Err(CrudError::Forbidden(format!(
                    "Entity with ID {} is not soft-deleted and cannot be restored.",
                    id
                )));
            }

            let mut update = E::update_many()
                .col_expr(deleted_at, null_expr())
                .filter(id_column.eq(id.clone()));
            if let Some(updated_at) = E::updated_at_column() {
                update = update.col_expr(updated_at, now_expr::<E>());
            }

            if update.exec(conn).await?.rows_affected == 0 {
                return Err(CrudError::NotFound(format!(
                    "Entity with ID {} not found during restore.",
                    id
                )));
            }
            log::debug!("Restored {} {}", E::sql_table_name(), id);

            self.fetch(conn, &id).await?.ok_or_else(|| CrudError::not_found(&id))
        })
        .await
    }

    /// Insert many rows in one transaction
    pub async fn bulk_create<C, A>(&self, conn: &C, models: Vec<A>) -> Result<Vec<E::Model>>
    where
        C: ConnectionTrait + TransactionTrait,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        safe_execute(async {
            let txn = conn.begin().await?;
            let mut created = Vec::with_capacity(models.len());
            for model in models {
                created.push(E::insert(model).exec_with_returning(&txn).await?);
            }
            txn.commit().await?;
            log::debug!("Bulk-created {} row(s) in {}", created.len(), E::sql_table_name());
            Ok(created)
        })
        .await
    }

    /// Update many rows in one transaction; ids matching no row are skipped
    pub async fn bulk_update<C, I, A>(&self, conn: &C, records: Vec<(I, A)>) -> Result<Vec<E::Model>>
    where
        C: ConnectionTrait + TransactionTrait,
        I: RecordId,
        A: ActiveModelTrait<Entity = E> + Send,
    {
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            let txn = conn.begin().await?;
            let mut updated = Vec::with_capacity(records.len());

            for (id, model) in records {
                let Some(update) = update_with_timestamp::<E, A>(model) else {
                    continue;
                };
                let result = update.filter(id_column.eq(id.clone())).exec(&txn).await?;
                if result.rows_affected > 0 {
                    if let Some(row) = self.fetch(&txn, &id).await? {
                        updated.push(row);
                    }
                }
            }

            txn.commit().await?;
            Ok(updated)
        })
        .await
    }

    /// Soft delete many rows; returns the number of rows affected
    pub async fn bulk_soft_delete<C, I>(&self, conn: &C, ids: &[I]) -> Result<u64>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        let Some(deleted_at) = E::deleted_at_column() else {
            return Err(CrudError::Unsupported("Soft delete not supported for this table.".to_string()));
        };
        if ids.is_empty() {
            return Ok(0);
        }
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            let mut update = E::update_many()
                .col_expr(deleted_at, now_expr::<E>())
                .filter(id_column.is_in(ids.iter().cloned()));
            if let Some(updated_at) = E::updated_at_column() {
                update = update.col_expr(updated_at, now_expr::<E>());
            }
            Ok(update.exec(conn).await?.rows_affected)
        })
        .await
    }

    /// Clear `deleted_at` on many rows; returns the number of rows affected
    pub async fn bulk_restore<C, I>(&self, conn: &C, ids: &[I]) -> Result<u64>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let id_column = require_id_column::<E>()?;

        let mut assignments = Vec::new();
        if let Some(updated_at) = E::updated_at_column() {
            assignments.push((updated_at, now_expr::<E>()));
        }
        if let Some(deleted_at) = E::deleted_at_column() {
            assignments.push((deleted_at, null_expr()));
        }
        if assignments.is_empty() {
            return Ok(0);
        }

        safe_execute(async {
            let mut update = E::update_many().filter(id_column.is_in(ids.iter().cloned()));
            for (column, expr) in assignments {
                update = update.col_expr(column, expr);
            }
            Ok(update.exec(conn).await?.rows_affected)
        })
        .await
    }

    /// Hard delete many rows; returns the number of rows affected
    pub async fn bulk_delete<C, I>(&self, conn: &C, ids: &[I]) -> Result<u64>
    where
        C: ConnectionTrait,
        I: RecordId,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let id_column = require_id_column::<E>()?;

        safe_execute(async {
            let result = E::delete_many()
                .filter(id_column.is_in(ids.iter().cloned()))
                .exec(conn)
                .await?;
            log::debug!("Deleted {} row(s) from {}", result.rows_affected, E::sql_table_name());
            Ok(result.rows_affected)
        })
        .await
    }
}

/// `UPDATE ... SET <model fields>, updated_at = now`, or `None` when there is
/// nothing to set
fn update_with_timestamp<E, A>(model: A) -> Option<sea_orm::UpdateMany<E>>
where
    E: CrudTable,
    A: ActiveModelTrait<Entity = E>,
{
    let updated_at = E::updated_at_column();
    if !model.is_changed() && updated_at.is_none() {
        return None;
    }

    let mut update = E::update_many().set(model);
    if let Some(column) = updated_at {
        update = update.col_expr(column, now_expr::<E>());
    }
    Some(update)
}

fn now_expr<E: CrudTable>() -> SimpleExpr {
    SimpleExpr::Value(E::timestamp_now())
}

fn null_expr() -> SimpleExpr {
    Expr::cust("NULL")
}
