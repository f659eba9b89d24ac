//! Connection settings and credentials for the supplier feed.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shared_utils::{config::ConfigError, env::get_env_var};

/// Where and how to reach the supplier. Deserialized from the `[supplier]`
/// section of the sync configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupplierConfig {
    /// Absolute URL of the inventory endpoint (POST).
    pub endpoint: String,
    /// Whole-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Environment variable holding the account user name.
    pub username_env: String,
    /// Environment variable holding the account password.
    pub password_env: String,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/stock".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
            username_env: "SUPPLIER_USERNAME".to_string(),
            password_env: "SUPPLIER_PASSWORD".to_string(),
        }
    }
}

impl SupplierConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

/// The shared secret pair sent with every inventory request.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Builds credentials from explicit values.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }

    /// Reads the user name and password from the environment variables named
    /// by `cfg`.
    pub fn from_env(cfg: &SupplierConfig) -> Result<Self, ConfigError> {
        let username = get_env_var(&cfg.username_env)?;
        let password = SecretString::new(get_env_var(&cfg.password_env)?.into());
        Ok(Self { username, password })
    }

    /// Account user name (not secret).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// JSON request body carrying the credentials.
    pub(crate) fn request_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
