use async_trait::async_trait;
use reqwest::{Client, Url, header};
use tracing::{debug, info, warn};

use crate::{
    errors::{ClientInitError, FetchError},
    models::raw_record::RawRecord,
    providers::{
        InventorySource,
        supplier_rest::{
            params::{Credentials, SupplierConfig},
            response::{DEFAULT_STRATEGIES, ShapeStrategy, extract_records_with},
        },
    },
};

/// Longest response-body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 512;

/// Pulls the full inventory snapshot from the supplier's JSON endpoint.
pub struct SupplierRestProvider {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
    strategies: Vec<ShapeStrategy>,
}

impl SupplierRestProvider {
    /// Creates a provider, reading credentials from the environment variables
    /// named in `cfg`.
    pub fn from_env(cfg: &SupplierConfig) -> Result<Self, ClientInitError> {
        let credentials = Credentials::from_env(cfg)?;
        Self::new(cfg, credentials)
    }

    /// Creates a provider with explicit credentials.
    pub fn new(cfg: &SupplierConfig, credentials: Credentials) -> Result<Self, ClientInitError> {
        let endpoint = Url::parse(&cfg.endpoint).map_err(|e| ClientInitError::InvalidEndpoint {
            endpoint: cfg.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ClientInitError::InvalidEndpoint {
                endpoint: cfg.endpoint.clone(),
                reason: format!("unsupported scheme `{}`", endpoint.scheme()),
            });
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("catalog-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.timeout())
            .connect_timeout(cfg.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            credentials,
            strategies: DEFAULT_STRATEGIES.to_vec(),
        })
    }

    /// Replaces the envelope detection strategies.
    pub fn with_strategies(mut self, strategies: Vec<ShapeStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl InventorySource for SupplierRestProvider {
    async fn fetch_inventory(&self) -> Result<Vec<RawRecord>, FetchError> {
        info!(endpoint = %self.endpoint, user = self.credentials.username(), "requesting supplier inventory");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&self.credentials.request_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) if !text.trim().is_empty() => excerpt(&text),
                Ok(_) => "<empty body>".to_string(),
                Err(e) => format!("<unreadable body: {e}>"),
            };
            warn!(status = status.as_u16(), %body, "supplier rejected inventory request");
            return Err(FetchError::Source {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "supplier inventory received");

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            FetchError::Decode(format!("{e} (body starts with: {})", excerpt(&body)))
        })?;

        let records = extract_records_with(payload, &self.strategies)?;
        info!(records = records.len(), "supplier inventory decoded");
        Ok(records)
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
