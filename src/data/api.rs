//! Blocking client for the analytics service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::DataSource;
use crate::data::wire::{
    decode_change_point, decode_correlations, decode_events, decode_metrics, decode_prices,
};
use crate::domain::{CorrelationRecord, DataWarning, Event, Metrics, PricePoint};
use crate::error::DataError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Fetch {
                url: base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    /// GET an endpoint and parse its body as JSON.
    ///
    /// Transport and status failures are `Fetch`; a body that is not JSON is
    /// `Malformed` for `dataset`.
    fn get_json(&self, name: &str, dataset: &'static str) -> Result<Value, DataError> {
        let url = self.endpoint(name);
        debug!(%url, "fetching");

        let resp = self.client.get(&url).send().map_err(|e| DataError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        if !resp.status().is_success() {
            return Err(DataError::Fetch {
                url,
                reason: format!("status {}", resp.status()),
            });
        }

        resp.json::<Value>()
            .map_err(|e| DataError::malformed(dataset, format!("response is not JSON: {e}")))
    }
}

impl DataSource for ApiClient {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch_prices(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<PricePoint>, DataError> {
        let body = self.get_json("prices", "prices")?;
        decode_prices(body, warnings)
    }

    fn fetch_events(&self, warnings: &mut Vec<DataWarning>) -> Result<Vec<Event>, DataError> {
        let body = self.get_json("events", "events")?;
        decode_events(body, warnings)
    }

    /// Metrics, falling back to `/change_points` when the metrics payload
    /// carries no change-point summary.
    fn fetch_metrics(&self, warnings: &mut Vec<DataWarning>) -> Result<Option<Metrics>, DataError> {
        let body = self.get_json("metrics", "metrics")?;
        let Some(mut metrics) = decode_metrics(body, warnings)? else {
            return Ok(None);
        };
        if metrics.cp_summary.is_none() {
            match self.get_json("change_points", "change_point") {
                Ok(body) => metrics.cp_summary = decode_change_point(body, warnings)?,
                Err(err) => warn!(error = %err, "change-point endpoint unavailable"),
            }
        }
        Ok(Some(metrics))
    }

    fn fetch_correlations(
        &self,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<Vec<CorrelationRecord>, DataError> {
        let body = self.get_json("correlations", "correlations")?;
        decode_correlations(body, warnings)
    }
}
