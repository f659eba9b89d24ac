//! Application configuration: TOML file plus environment overrides.
//!
//! Every section is optional:
//!
//! ```toml
//! database_url = "catalog.db"
//!
//! [supplier]
//! endpoint = "https://supplier.example/api/stock"
//! timeout_secs = 60
//! username_env = "SUPPLIER_USERNAME"
//! password_env = "SUPPLIER_PASSWORD"
//!
//! [sync]
//! batch_size = 10
//! max_error_details = 5
//! stale_after_mins = 120
//! ```
//!
//! `DATABASE_URL` and `SYNC_BATCH_SIZE` in the environment win over the file. Supplier
//! credentials never live in the file; it only names the variables that hold
//! them.
//!
//! Entrypoints: [`load_config_str`], [`load_config_path`], [`AppConfig::load`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared_utils::{
    config::ConfigError,
    env::{get_env_var_opt, parse_env_var},
};
use supplier_client::providers::supplier_rest::params::SupplierConfig;

use crate::sync::SyncOptions;

/// Environment variable overriding [`AppConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding [`SyncSettings::batch_size`].
pub const BATCH_SIZE_ENV: &str = "SYNC_BATCH_SIZE";

#[derive(thiserror::Error, Debug)]
pub enum AppConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite path or `sqlite://` URL.
    pub database_url: String,
    pub supplier: SupplierConfig,
    pub sync: SyncSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "catalog.db".to_string(),
            supplier: SupplierConfig::default(),
            sync: SyncSettings::default(),
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Records between progress writes and stop checks.
    pub batch_size: usize,
    /// Record errors quoted in a run's final message.
    pub max_error_details: usize,
    /// Active runs silent for this long are reaped before a new start.
    /// Absent or 0 disables automatic reaping.
    pub stale_after_mins: Option<u64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_error_details: 5,
            stale_after_mins: Some(120),
        }
    }
}

impl SyncSettings {
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            batch_size: self.batch_size,
            max_error_details: self.max_error_details,
            stale_after: self
                .stale_after_mins
                .filter(|m| *m > 0)
                .and_then(|m| i64::try_from(m).ok())
                .map(chrono::Duration::minutes),
        }
    }
}

impl AppConfig {
    /// Reads `path` when given (defaults otherwise), then applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppConfigError> {
        let mut cfg = match path {
            Some(p) => load_config_path(p)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `DATABASE_URL` / `SYNC_BATCH_SIZE` when set and non-empty.
    pub fn apply_env(&mut self) -> Result<(), AppConfigError> {
        if let Some(url) = get_env_var_opt(DATABASE_URL_ENV)? {
            self.database_url = url;
        }
        if let Some(batch_size) = parse_env_var::<usize>(BATCH_SIZE_ENV)? {
            self.sync.batch_size = batch_size;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.sync.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sync.batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses and validates a TOML string. No environment overrides.
pub fn load_config_str(s: &str) -> Result<AppConfig, AppConfigError> {
    let cfg: AppConfig = toml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Reads, parses and validates a TOML file. No environment overrides.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<AppConfig, AppConfigError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).map_err(|source| AppConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_config_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg.database_url, "catalog.db");
        assert_eq!(cfg.sync, SyncSettings::default());
        assert_eq!(cfg.supplier.username_env, "SUPPLIER_USERNAME");
    }

    #[test]
    fn full_file() {
        let cfg = load_config_str(
            r#"
            database_url = "sqlite:///var/lib/catalog.db"

            [supplier]
            endpoint = "https://supplier.test/api/stock"
            timeout_secs = 30
            username_env = "ACME_USER"
            password_env = "ACME_PASS"

            [sync]
            batch_size = 25
            max_error_details = 3
            stale_after_mins = 0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.supplier.endpoint, "https://supplier.test/api/stock");
        assert_eq!(cfg.supplier.timeout_secs, 30);
        assert_eq!(cfg.supplier.password_env, "ACME_PASS");
        let opts = cfg.sync.to_options();
        assert_eq!(opts.batch_size, 25);
        assert_eq!(opts.max_error_details, 3);
        assert_eq!(opts.stale_after, None);
    }

    #[test]
    fn default_stale_threshold_is_two_hours() {
        let opts = SyncSettings::default().to_options();
        assert_eq!(opts.stale_after, Some(chrono::Duration::minutes(120)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = load_config_str("[sync]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            AppConfigError::Env(ConfigError::InvalidValue { ref key, .. }) if key == "sync.batch_size"
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            load_config_str("[sync]\nbatch = 3\n"),
            Err(AppConfigError::Parse(_))
        ));
        assert!(matches!(
            load_config_str("[supplier]\npassword = \"hunter2\"\n"),
            Err(AppConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    #[serial]
    fn database_url_env_overrides_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sync.toml");
        std::fs::write(&path, "database_url = \"from-file.db\"\n").unwrap();

        unsafe { std::env::set_var(DATABASE_URL_ENV, "from-env.db") };
        let cfg = AppConfig::load(Some(&path)).unwrap();
        unsafe { std::env::remove_var(DATABASE_URL_ENV) };
        assert_eq!(cfg.database_url, "from-env.db");

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.database_url, "from-file.db");
    }

    #[test]
    #[serial]
    fn batch_size_env_is_parsed_and_validated() {
        unsafe { std::env::set_var(BATCH_SIZE_ENV, "25") };
        let cfg = AppConfig::load(None);
        unsafe { std::env::set_var(BATCH_SIZE_ENV, "0") };
        let zero = AppConfig::load(None);
        unsafe { std::env::set_var(BATCH_SIZE_ENV, "lots") };
        let garbage = AppConfig::load(None);
        unsafe { std::env::remove_var(BATCH_SIZE_ENV) };

        assert_eq!(cfg.unwrap().sync.batch_size, 25);
        assert!(matches!(zero, Err(AppConfigError::Env(ConfigError::InvalidValue { .. }))));
        assert!(matches!(garbage, Err(AppConfigError::Env(ConfigError::InvalidEnvVar { .. }))));
    }
}
