//! Configuration management for sea-crud
//!
//! Pagination defaults can come from three places, in increasing order of
//! precedence: the built-in [`PAGINATION_DEFAULTS`], a TOML configuration file,
//! and the `SEA_CRUD_PAGINATION_*` environment variables. Resolved values are
//! exposed to repositories through the [`ConfigService`] trait, keyed by the
//! [`CONFIG_NAMESPACE`] namespace.

pub use crate::constants::CONFIG_NAMESPACE;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DEFAULT_LIST_LIMIT, DEFAULT_MAX_LIST_LIMIT,
    DEFAULT_PAGINATION_LIMIT, DEFAULT_PAGINATION_OFFSET, PAGINATION_LIMIT_ENV, PAGINATION_OFFSET_ENV,
};
use crate::error::CrudError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Namespace the CRUD factory list defaults are registered under
pub const LISTING_NAMESPACE: &str = "sea-crud.listing";

/// Default pagination window applied when a query does not specify one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub limit: u64,
    pub offset: u64,
}

/// Package-wide fallback values
pub const PAGINATION_DEFAULTS: PaginationConfig = PaginationConfig {
    limit: DEFAULT_PAGINATION_LIMIT,
    offset: DEFAULT_PAGINATION_OFFSET,
};

impl Default for PaginationConfig {
    fn default() -> Self {
        PAGINATION_DEFAULTS
    }
}

impl PaginationConfig {
    /// Build the pagination defaults from `SEA_CRUD_PAGINATION_LIMIT` and
    /// `SEA_CRUD_PAGINATION_OFFSET`, falling back to [`PAGINATION_DEFAULTS`].
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields with any pagination environment variables that are set
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Some(limit) = read_env_u64(PAGINATION_LIMIT_ENV)? {
            self.limit = limit;
        }
        if let Some(offset) = read_env_u64(PAGINATION_OFFSET_ENV)? {
            self.offset = offset;
        }
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.limit == 0 {
            return Err(CrudError::Config("pagination limit must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn read_env_u64(name: &str) -> crate::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CrudError::Config(format!("{} must be a non-negative integer, got '{}': {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

/// Minimal configuration lookup used by repositories and query builders
pub trait ConfigService: Send + Sync {
    /// Look up a value by dotted key (e.g. `sea-crud.pagination.limit`)
    fn get(&self, key: &str) -> Option<JsonValue>;
}

impl dyn ConfigService + '_ {
    /// Look up a value, falling back to `default` when it is missing or has
    /// the wrong shape.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring config value for '{}': {}", key, e);
                default
            }),
            None => default,
        }
    }
}

impl ConfigService for HashMap<String, JsonValue> {
    fn get(&self, key: &str) -> Option<JsonValue> {
        HashMap::get(self, key).cloned()
    }
}

/// In-memory configuration store keyed by namespace
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    namespaces: HashMap<String, JsonValue>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the pagination defaults resolved from the environment
    pub fn with_pagination_from_env() -> crate::Result<Self> {
        let mut registry = Self::new();
        registry.register(CONFIG_NAMESPACE, PaginationConfig::from_env()?)?;
        Ok(registry)
    }

    /// Register a serializable value under a namespace, replacing any previous value
    pub fn register<T: Serialize>(&mut self, namespace: &str, value: T) -> crate::Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| CrudError::Config(format!("Failed to register '{}': {}", namespace, e)))?;
        self.namespaces.insert(namespace.to_string(), value);
        Ok(())
    }

    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Typed lookup with fallback
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        (self as &dyn ConfigService).get_or(key, default)
    }
}

impl ConfigService for ConfigRegistry {
    fn get(&self, key: &str) -> Option<JsonValue> {
        if let Some(value) = self.namespaces.get(key) {
            return Some(value.clone());
        }

        // Longest registered namespace that prefixes the key wins
        let (namespace, value) = self
            .namespaces
            .iter()
            .filter(|(ns, _)| key.len() > ns.len() && key.starts_with(ns.as_str()) && key[ns.len()..].starts_with('.'))
            .max_by_key(|(ns, _)| ns.len())?;

        key[namespace.len() + 1..]
            .split('.')
            .try_fold(value, |current, segment| current.get(segment))
            .cloned()
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pagination: PaginationConfig,
    pub listing: ListingConfig,
    pub logging: LoggingConfig,
}

/// Defaults for the CRUD factory `list` operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page size used when a list request does not specify one
    pub default_limit: u64,
    /// Upper bound applied to requested page sizes
    pub max_limit: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// One of: off, error, warn, info, debug, trace
    pub level: String,
    /// Write log lines to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIST_LIMIT,
            max_limit: DEFAULT_MAX_LIST_LIMIT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Some(current_dir_config);
        }

        // 2. Check XDG config directory
        let xdg_config = dirs::config_dir()?.join(CONFIG_DIR_NAME).join("config.toml");
        xdg_config.exists().then_some(xdg_config)
    }

    /// Apply `SEA_CRUD_PAGINATION_*` environment variables on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.pagination
            .apply_env()
            .context("Failed to apply pagination environment overrides")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.pagination.validate()?;

        if self.listing.default_limit == 0 {
            anyhow::bail!("listing.default_limit must be greater than 0");
        }
        if self.listing.default_limit > self.listing.max_limit {
            anyhow::bail!(
                "listing.default_limit ({}) cannot exceed listing.max_limit ({})",
                self.listing.default_limit,
                self.listing.max_limit
            );
        }

        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            anyhow::bail!("Invalid logging level '{}'", self.logging.level);
        }

        Ok(())
    }

    /// Expose the resolved values through a [`ConfigService`]
    pub fn into_registry(&self) -> crate::Result<ConfigRegistry> {
        let mut registry = ConfigRegistry::new();
        registry.register(CONFIG_NAMESPACE, self.pagination)?;
        registry.register(LISTING_NAMESPACE, self.listing)?;
        Ok(registry)
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        let header = format!(
            "# sea-crud Configuration File\n# Generated on {}\n# Pagination values can be overridden with {} and {}\n\n",
            chrono::Local::now().format("%Y-%m-%d"),
            PAGINATION_LIMIT_ENV,
            PAGINATION_OFFSET_ENV
        );

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, header + &toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        log::info!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }
}
