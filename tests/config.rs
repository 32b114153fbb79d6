use sea_crud::config::{Config, ConfigRegistry, ConfigService, PaginationConfig, LISTING_NAMESPACE};
use sea_crud::{CONFIG_NAMESPACE, PAGINATION_DEFAULTS};
use serde_json::json;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.pagination, PAGINATION_DEFAULTS);
    assert_eq!(config.pagination.limit, 10);
    assert_eq!(config.pagination.offset, 0);
    assert_eq!(config.listing.default_limit, 20);
    assert_eq!(config.listing.max_limit, 100);
    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Zero page size should fail
    config.pagination.limit = 0;
    assert!(config.validate().is_err());

    // Reset and test listing bounds
    config.pagination.limit = 10;
    config.listing.default_limit = 500;
    assert!(config.validate().is_err());

    // Reset and test unknown log level
    config.listing.default_limit = 20;
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("[pagination]"));
    assert!(toml_str.contains("limit = 10"));
    assert!(toml_str.contains("max_limit = 100"));
}

#[test]
fn test_partial_config_deserialization() {
    let config: Config = toml::from_str(
        r#"
        [pagination]
        limit = 25
        "#,
    )
    .unwrap();

    assert_eq!(config.pagination.limit, 25);
    assert_eq!(config.pagination.offset, 0);
    assert_eq!(config.listing.default_limit, 20);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[pagination]\nlimit = 15\noffset = 3\n\n[listing]\ndefault_limit = 5\nmax_limit = 50\n\n[logging]\nlevel = \"debug\""
    )
    .unwrap();

    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.pagination, PaginationConfig { limit: 15, offset: 3 });
    assert_eq!(config.listing.max_limit, 50);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_from_invalid_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pagination]\nlimit = \"many\"").unwrap();

    let err = Config::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));

    assert!(Config::load_from_file("/definitely/not/here/sea-crud.toml").is_err());
}

#[test]
fn test_generate_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# sea-crud Configuration File"));
    assert!(content.contains("SEA_CRUD_PAGINATION_LIMIT"));

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.pagination, PAGINATION_DEFAULTS);
}

#[test]
fn test_into_registry() {
    let mut config = Config::default();
    config.pagination.limit = 30;
    config.listing.max_limit = 60;

    let registry = config.into_registry().unwrap();
    assert_eq!(registry.get(&format!("{}.limit", CONFIG_NAMESPACE)), Some(json!(30)));
    assert_eq!(registry.get(&format!("{}.max_limit", LISTING_NAMESPACE)), Some(json!(60)));
    assert_eq!(registry.get_or(&format!("{}.offset", CONFIG_NAMESPACE), 99u64), 0);
}

#[test]
fn test_registry_get_or_falls_back() {
    let mut registry = ConfigRegistry::new();
    registry.register("app", json!({ "name": "demo", "retries": "three" })).unwrap();

    assert_eq!(registry.get_or("app.name", String::new()), "demo");
    assert_eq!(registry.get_or("app.retries", 3u32), 3);
    assert_eq!(registry.get_or("app.missing", 7u32), 7);
    assert!(registry.contains_namespace("app"));
    assert!(!registry.contains_namespace("other"));
}

// All environment manipulation lives in this one test so parallel tests
// never observe each other's variables.
#[test]
fn test_pagination_from_env() {
    std::env::remove_var("SEA_CRUD_PAGINATION_LIMIT");
    std::env::remove_var("SEA_CRUD_PAGINATION_OFFSET");
    assert_eq!(PaginationConfig::from_env().unwrap(), PAGINATION_DEFAULTS);

    std::env::set_var("SEA_CRUD_PAGINATION_LIMIT", "25");
    std::env::set_var("SEA_CRUD_PAGINATION_OFFSET", "");
    assert_eq!(PaginationConfig::from_env().unwrap(), PaginationConfig { limit: 25, offset: 0 });

    let registry = ConfigRegistry::with_pagination_from_env().unwrap();
    assert_eq!(registry.get_or(&format!("{}.limit", CONFIG_NAMESPACE), 0u64), 25);

    let mut config = Config::default();
    config.apply_env_overrides().unwrap();
    assert_eq!(config.pagination.limit, 25);

    // Environment wins over whatever file is found
    let loaded = Config::load().unwrap();
    assert_eq!(loaded.pagination.limit, 25);

    std::env::set_var("SEA_CRUD_PAGINATION_OFFSET", "abc");
    let err = PaginationConfig::from_env().unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(Config::default().apply_env_overrides().is_err());
    assert!(Config::load().is_err());

    std::env::remove_var("SEA_CRUD_PAGINATION_LIMIT");
    std::env::remove_var("SEA_CRUD_PAGINATION_OFFSET");
}

#[test]
fn test_default_config_path() {
    match dirs::config_dir() {
        Some(dir) => {
            let path = Config::get_default_config_path().unwrap();
            assert_eq!(path, dir.join("sea-crud").join("config.toml"));
        }
        None => assert!(Config::get_default_config_path().is_err()),
    }
}
