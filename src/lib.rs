//! sea-crud - generic CRUD helpers for SeaORM entities
//!
//! This library removes the boilerplate around list, filter, paginate and
//! soft-delete operations on SeaORM tables. All state lives in the database;
//! every operation is a single call chain into SeaORM, taking the connection
//! (or transaction) it should run on.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`repositories`] - Per-table repository with soft delete, restore, purge and bulk operations
//! * [`query`] - `find_all` query building and structured filters
//! * [`crud`] - Configurable CRUD operations with hooks, scopes and validation
//! * [`schema`] - Table metadata used by the other modules
//! * [`config`] - Pagination defaults and configuration file handling
//! * [`error`] - Error type shared by all operations

/// Configuration: pagination defaults, config namespace and config file
pub mod config;

/// Package constants and default values
pub mod constants;

/// Configurable CRUD operations built from options
pub mod crud;

/// Error type and database error translation
pub mod error;

/// Logging setup
pub mod logger;

/// `find_all` query building, list DTOs and structured filters
pub mod query;

/// Repository layer for database operations
pub mod repositories;

/// Table metadata: column lookup, schema registry, relation options
pub mod schema;

mod value;

pub use config::{ConfigRegistry, ConfigService, PaginationConfig, CONFIG_NAMESPACE, PAGINATION_DEFAULTS};
pub use crud::{crud_factory, Crud, CrudFactory, CrudOptions, OperationContext, SoftDeleteConfig};
pub use error::{CrudError, Result};
pub use query::{BaseQueryBuilder, PaginationQuery, SortOrder};
pub use repositories::{safe_execute, CrudRepository};
pub use schema::{CrudTable, FindAllOptions, RecordId, RelationOptions, SchemaRegistry, TableDescriptor};
