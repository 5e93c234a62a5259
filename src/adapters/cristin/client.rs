//! Cristin REST client
//!
//! This module provides the HTTP implementation of [`SourceFetcher`] against
//! the Cristin API. Every request is attempted once; the configured timeout
//! bounds it.

use super::fetcher::{ListQuery, Page, SourceFetcher, SourceResult};
use super::models::TOTAL_COUNT_HEADER;
use crate::config::CristinConfig;
use crate::core::context::ExecutionContext;
use crate::domain::{EntityKind, SourceError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the Cristin API
///
/// # Example
///
/// ```no_run
/// use cristin_sync::adapters::cristin::{CristinClient, SourceFetcher};
/// use cristin_sync::config::CristinConfig;
/// use cristin_sync::core::context::ExecutionContext;
/// use cristin_sync::domain::EntityKind;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CristinClient::new(CristinConfig::default())?;
/// let person = client
///     .fetch_one(&ExecutionContext::system(), EntityKind::Persons, "12345")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct CristinClient {
    /// Base URL without a trailing slash
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    /// Value of the `lang` query parameter
    lang: String,
}

impl CristinClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CristinConfig) -> SourceResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                SourceError::ConnectionFailed(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            lang: config.lang,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, url: &str, params: &[(String, String)]) -> SourceResult<Response> {
        self.client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(map_transport_error)
    }
}

/// Maps a transport-level failure to the source error taxonomy
fn map_transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout(e.to_string())
    } else if e.is_decode() {
        SourceError::InvalidResponse(e.to_string())
    } else {
        SourceError::ConnectionFailed(e.to_string())
    }
}

/// Turns a non-success status into a source error
async fn status_error(resp: Response, what: &str) -> SourceError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(what.to_string()),
        s if s.is_server_error() => SourceError::ServerError {
            status: s.as_u16(),
            message: body,
        },
        s => SourceError::ClientError {
            status: s.as_u16(),
            message: body,
        },
    }
}

/// Reads the total entry count from the response headers
fn total_count(resp: &Response) -> Option<usize> {
    resp.headers()
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl SourceFetcher for CristinClient {
    async fn fetch_one(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        external_id: &str,
    ) -> SourceResult<Value> {
        let path = kind.entity_path(external_id);
        let url = self.url(&path);

        tracing::debug!(url = %url, kind = %kind, external_id = %external_id, "Fetching entity");

        let params = vec![("lang".to_string(), self.lang.clone())];
        let resp = self.send(&url, &params).await?;

        if !resp.status().is_success() {
            return Err(status_error(resp, &path).await);
        }

        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }

    async fn fetch_page(
        &self,
        _ctx: &ExecutionContext,
        kind: EntityKind,
        query: &ListQuery,
        page: usize,
        page_size: usize,
    ) -> SourceResult<Page> {
        let url = self.url(kind.list_path());

        let mut params = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), page_size.to_string()),
            ("lang".to_string(), self.lang.clone()),
        ];
        params.extend(query.params().iter().cloned());

        tracing::debug!(url = %url, kind = %kind, page, page_size, "Fetching list page");

        let resp = self.send(&url, &params).await?;

        if !resp.status().is_success() {
            return Err(status_error(resp, kind.list_path()).await);
        }

        let total = total_count(&resp);
        let body: Value = resp
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        let data = match body {
            Value::Array(items) => items,
            other => {
                return Err(SourceError::InvalidResponse(format!(
                    "Expected a JSON array from {}, got {}",
                    kind.list_path(),
                    json_type_name(&other)
                )))
            }
        };

        Ok(Page {
            total: total.unwrap_or(data.len()),
            data,
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
