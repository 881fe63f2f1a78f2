//! HTTP client for the Art Institute of Chicago exhibitions API.

use artic_etl_telemetry::Metrics;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::loader::ExhibitionSource;

/// One page of the exhibitions feed.
#[derive(Debug, Clone)]
pub struct ExhibitionsPage {
    /// Raw exhibition objects from the response's `data` array.
    pub data: Vec<Value>,
    /// Page count advertised under `pagination.total_pages`, when present.
    pub total_pages: Option<u64>,
}

/// Client for the public exhibitions endpoint.
pub struct ExhibitionsClient {
    client: Client,
    base_url: String,
    limit: u32,
    metrics: Metrics,
}

impl ExhibitionsClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.artic.edu/api/v1`
    /// * `limit` - Page size sent as the `limit` query parameter (the API caps this at 100)
    /// * `metrics` - Metrics collector
    pub fn new(base_url: &str, limit: u32, metrics: Metrics) -> Self {
        info!(base_url, limit, "Initialized exhibitions API client");

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
            metrics,
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}/exhibitions?limit={}&page={}",
            self.base_url, self.limit, page
        )
    }
}

#[async_trait]
impl ExhibitionSource for ExhibitionsClient {
    /// Fetch one page of exhibitions.
    ///
    /// Any non-success status or a body without a `data` array is a fatal
    /// error; there is no retry.
    async fn fetch_page(&self, page: u32) -> Result<ExhibitionsPage, ApiError> {
        let start = Instant::now();
        let response = self.client.get(self.page_url(page)).send().await?;

        if !response.status().is_success() {
            self.metrics.inc_api_errors();
            return Err(ApiError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        self.metrics
            .observe_api_latency("fetch_page", start.elapsed().as_secs_f64());

        let data = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .ok_or(ApiError::MissingData)?;
        let total_pages = body
            .pointer("/pagination/total_pages")
            .and_then(Value::as_u64);

        self.metrics.inc_pages_fetched();
        self.metrics.inc_records_fetched(data.len() as u64);
        debug!(page, records = data.len(), ?total_pages, "Fetched exhibitions page");

        Ok(ExhibitionsPage { data, total_pages })
    }
}
