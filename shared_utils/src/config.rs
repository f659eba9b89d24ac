use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but its value cannot be used.
    #[error("Invalid value for environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// Name of the offending variable.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configuration value (file or default) is out of its allowed range.
    #[error("Invalid configuration for `{key}`: {reason}")]
    InvalidValue {
        /// Dotted path of the configuration key, e.g. `sync.batch_size`.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}
