use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://rene_shop.db?mode=rwc";
const DEFAULT_BASE_CURRENCY: &str = "USD";
const CONFIG_DIR: &str = "config";
const DEFAULT_BUCKET_NAME: &str = "rene-shop";
const DEFAULT_ACL: &str = "publicRead";
const DEFAULT_UPLOAD_TO: &str = "product_images/";
const DEFAULT_STORAGE_BASE_URL: &str = "https://storage.googleapis.com";
const DEFAULT_RATE_TIMEOUT_SECS: u64 = 10;

/// Object storage settings for product photos
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Bucket holding product photos
    #[serde(default = "default_bucket_name")]
    #[validate(length(min = 3, max = 63))]
    pub bucket_name: String,

    /// Canned ACL applied to uploaded objects
    #[serde(default = "default_acl")]
    pub default_acl: String,

    /// Whether an upload may replace an existing object of the same name
    #[serde(default)]
    pub file_overwrite: bool,

    /// Object name prefix for uploads
    #[serde(default = "default_upload_to")]
    pub upload_to: String,

    /// Public endpoint objects are served from
    #[serde(default = "default_storage_base_url")]
    #[validate(url)]
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_name: default_bucket_name(),
            default_acl: default_acl(),
            file_overwrite: false,
            upload_to: default_upload_to(),
            base_url: default_storage_base_url(),
        }
    }
}

/// Currency rate lookup settings
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RatesConfig {
    /// HTTP rate service; when unset only `fixed` rates are available
    #[serde(default)]
    #[validate(url)]
    pub provider_url: Option<String>,

    /// Rates pinned from the base currency, keyed by target currency code
    #[serde(default)]
    #[validate(custom = "validate_fixed_rates")]
    pub fixed: HashMap<String, Decimal>,

    /// Request timeout for the HTTP rate service (seconds)
    #[serde(default = "default_rate_timeout_secs")]
    pub timeout_secs: u64,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Currency product prices are stored in
    #[serde(default = "default_base_currency")]
    #[validate(custom = "validate_currency_code")]
    pub base_currency: String,

    /// Product photo storage
    #[serde(default)]
    #[validate]
    pub storage: StorageConfig,

    /// Currency rate lookup
    #[serde(default)]
    #[validate]
    pub rates: RatesConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the database and environment
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            base_currency: default_base_currency(),
            storage: StorageConfig::default(),
            rates: RatesConfig::default(),
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_base_currency() -> String {
    DEFAULT_BASE_CURRENCY.to_string()
}

fn default_bucket_name() -> String {
    DEFAULT_BUCKET_NAME.to_string()
}

fn default_acl() -> String {
    DEFAULT_ACL.to_string()
}

fn default_upload_to() -> String {
    DEFAULT_UPLOAD_TO.to_string()
}

fn default_storage_base_url() -> String {
    DEFAULT_STORAGE_BASE_URL.to_string()
}

fn default_rate_timeout_secs() -> u64 {
    DEFAULT_RATE_TIMEOUT_SECS
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_log_level");
            err.message = Some("log_level must be one of trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_currency_code");
        err.message = Some("currency must be a 3-letter code".into());
        Err(err)
    }
}

fn validate_fixed_rates(rates: &HashMap<String, Decimal>) -> Result<(), ValidationError> {
    for (currency, rate) in rates {
        validate_currency_code(currency)?;
        if *rate <= Decimal::ZERO {
            let mut err = ValidationError::new("invalid_rate");
            err.message = Some(format!("rate for {} must be positive", currency).into());
            return Err(err);
        }
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("rene_shop={},migrations={},sqlx=warn", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from an explicit config directory and profile
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("base_currency", DEFAULT_BASE_CURRENCY)?
        .add_source(File::with_name(&config_dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&config_dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_config(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn defaults_match_the_shop_bucket() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        assert_eq!(cfg.base_currency, "USD");
        assert_eq!(cfg.storage.bucket_name, "rene-shop");
        assert_eq!(cfg.storage.default_acl, "publicRead");
        assert!(!cfg.storage.file_overwrite);
        assert_eq!(cfg.storage.upload_to, "product_images/");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_config_dir_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = load_config_from(&temp_dir.path().join("absent"), "development").unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let temp_dir = setup_test_config(&[
            (
                "default.toml",
                r#"
                database_url = "postgres://localhost/shop"
                log_level = "debug"

                [storage]
                bucket_name = "shop-media"

                [rates.fixed]
                EUR = 0.92
                "#,
            ),
            (
                "staging.toml",
                r#"
                database_url = "postgres://staging/shop"
                "#,
            ),
        ]);

        let cfg = load_config_from(temp_dir.path(), "staging").unwrap();
        assert_eq!(cfg.database_url, "postgres://staging/shop");
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.storage.bucket_name, "shop-media");
        assert_eq!(cfg.storage.upload_to, "product_images/");

        let eur = cfg
            .rates
            .fixed
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case("EUR"))
            .map(|(_, rate)| *rate);
        assert_eq!(eur, Some(dec!(0.92)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let temp_dir = setup_test_config(&[(
            "default.toml",
            r#"
            log_level = "loud"
            base_currency = "DOLLARS"
            "#,
        )]);

        let result = load_config_from(temp_dir.path(), "development");
        match result {
            Err(AppConfigError::Validation(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("log_level"));
                assert!(fields.contains_key("base_currency"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_positive_fixed_rate_is_rejected() {
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), Decimal::ZERO);
        assert!(validate_fixed_rates(&rates).is_err());

        rates.insert("EUR".to_string(), dec!(1.1));
        assert!(validate_fixed_rates(&rates).is_ok());
    }
}
