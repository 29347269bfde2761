//! Moonraker HTTP client: liveness probe and batched object-status query.
//!
//! Each call is a single attempt; retries are left to the next scrape.

use crate::fields::FieldBag;
use crate::models::{QueryEnvelope, RawStatusMap};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const INFO_PATH: &str = "/printer/info";
pub const QUERY_PATH: &str = "/printer/objects/query";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("cannot read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Connection-level failures, non-success statuses included.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Status { .. })
    }
}

/// Upstream calls the collector depends on.
pub trait StatusSource: Send + Sync {
    /// `GET /printer/info`; the body is read but not interpreted.
    fn probe_info(&self) -> impl Future<Output = Result<(), FetchError>> + Send;

    /// One batched status query for every name, in the given order.
    fn fetch_status(&self, names: &[String]) -> impl Future<Output = Result<RawStatusMap, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct StatusFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl StatusFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn info_url(&self) -> String {
        format!("{}{}", self.endpoint, INFO_PATH)
    }

    pub fn query_url(&self, names: &[String]) -> String {
        let query = encode_query(names);
        if query.is_empty() {
            format!("{}{}", self.endpoint, QUERY_PATH)
        } else {
            format!("{}{}?{}", self.endpoint, QUERY_PATH, query)
        }
    }

    async fn get_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("requesting {url}");
        let response = self.client.get(url).send().await.map_err(FetchError::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let body = response.bytes().await.map_err(FetchError::Body)?;
        debug!("{url} returned {} bytes", body.len());
        Ok(body.to_vec())
    }
}

impl StatusSource for StatusFetcher {
    async fn probe_info(&self) -> Result<(), FetchError> {
        self.get_body(&self.info_url()).await.map(|_| ())
    }

    async fn fetch_status(&self, names: &[String]) -> Result<RawStatusMap, FetchError> {
        let body = self.get_body(&self.query_url(names)).await?;
        parse_status(&body)
    }
}

/// Object names URL-escaped and joined with `&`, e.g. `extruder&temperature_fan%20chamber`.
pub fn encode_query(names: &[String]) -> String {
    names
        .iter()
        .map(|n| urlencoding::encode(n).into_owned())
        .collect::<Vec<_>>()
        .join("&")
}

/// Decodes a status envelope. Entries that are not JSON objects become empty bags.
pub fn parse_status(body: &[u8]) -> Result<RawStatusMap, FetchError> {
    let envelope: QueryEnvelope = serde_json::from_slice(body)?;
    let status = envelope
        .result
        .status
        .into_iter()
        .map(|(name, value)| {
            let bag = match value {
                Value::Object(map) => map,
                other => {
                    debug!(object = %name, "status entry is not an object: {other}");
                    FieldBag::new()
                }
            };
            (name, bag)
        })
        .collect();
    Ok(status)
}
