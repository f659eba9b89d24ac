use std::error::Error as StdError;

use shared_utils::config::ConfigError;
use thiserror::Error;

/// Errors raised while fetching the inventory snapshot.
///
/// Every variant is fatal to a sync run; record-level problems never surface here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("transport error: {detail}")]
    Transport {
        /// The error and its chain of causes, flattened for display.
        detail: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The supplier answered with a non-success status code.
    #[error("supplier returned HTTP {status}: {body}")]
    Source {
        /// HTTP status code.
        status: u16,
        /// Response body text, or a placeholder when it could not be read.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("could not decode supplier response: {0}")]
    Decode(String),

    /// No record array could be located in the payload.
    #[error("unrecognised supplier response shape: {detail}")]
    Shape {
        /// Diagnostic text from the payload (`message`/`error`/`status`) or a
        /// description of what was found instead.
        detail: String,
    },

    /// A record array was found but it was empty.
    #[error("supplier returned an empty inventory{}", .detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default())]
    EmptyPayload {
        /// Diagnostic text carried alongside the empty array, if any.
        detail: Option<String>,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(source: reqwest::Error) -> Self {
        FetchError::Transport {
            detail: error_chain(&source),
            source,
        }
    }
}

/// Errors that can occur while building a supplier client.
#[derive(Debug, Error)]
pub enum ClientInitError {
    /// Credentials could not be read from the environment.
    #[error("supplier credentials unavailable: {0}")]
    Credentials(#[from] ConfigError),

    /// The configured endpoint is not an absolute http(s) URL.
    #[error("invalid supplier endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint {
        /// The configured value.
        endpoint: String,
        /// Parse failure or scheme problem.
        reason: String,
    },

    /// Failed to init reqwest client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Renders an error followed by each of its causes, `: `-separated.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        cur = cause.source();
    }
    out
}
