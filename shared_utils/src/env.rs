//! Environment variable accessors returning [`ConfigError`] instead of `VarError`.

use std::{env::VarError, fmt::Display, str::FromStr};

use crate::config::ConfigError;

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Empty values are treated as missing: a credential exported as `""` is almost
/// always a deployment mistake.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    match get_env_var_opt(name)? {
        Some(v) => Ok(v),
        None => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

/// Reads an optional environment variable. Unset and empty both yield `None`.
pub fn get_env_var_opt(name: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            reason: "value is not valid unicode".to_string(),
        }),
    }
}

/// Reads and parses an optional environment variable.
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = get_env_var_opt(name)? else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            reason: e.to_string(),
        })
}
