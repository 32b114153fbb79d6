//! Crate-wide constants and default values

/// Namespace the pagination defaults are registered under
pub const CONFIG_NAMESPACE: &str = "sea-crud.pagination";

/// Environment variable overriding the default page size
pub const PAGINATION_LIMIT_ENV: &str = "SEA_CRUD_PAGINATION_LIMIT";

/// Environment variable overriding the default page offset
pub const PAGINATION_OFFSET_ENV: &str = "SEA_CRUD_PAGINATION_OFFSET";

/// Repository list defaults
pub const DEFAULT_PAGINATION_LIMIT: u64 = 10;
pub const DEFAULT_PAGINATION_OFFSET: u64 = 0;

/// CRUD factory list defaults
pub const DEFAULT_LIST_LIMIT: u64 = 20;
pub const DEFAULT_MAX_LIST_LIMIT: u64 = 100;

/// Conventional column names
pub const ID_COLUMN: &str = "id";
pub const DELETED_AT_COLUMN: &str = "deleted_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Configuration file lookup
pub const CONFIG_FILE_NAME: &str = "sea-crud.toml";
pub const CONFIG_DIR_NAME: &str = "sea-crud";

/// Message printed after generating a configuration file
pub const CONFIG_GENERATED: &str = "Generated default configuration";
