use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.r2afosne.dpdns.org";

/// The fixed set of catalog endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Categories,
    Search,
    List,
    Recommend,
    Latest,
    ParseSingle,
    ParseAll,
}

impl Endpoint {
    pub const ALL: &[Endpoint] = &[
        Self::Categories,
        Self::Search,
        Self::List,
        Self::Recommend,
        Self::Latest,
        Self::ParseSingle,
        Self::ParseAll,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Categories => "/vod/categories",
            Self::Search => "/vod/search",
            Self::List => "/vod/list",
            Self::Recommend => "/vod/recommend",
            Self::Latest => "/vod/latest",
            Self::ParseSingle => "/vod/parse/single",
            Self::ParseAll => "/vod/parse/all",
        }
    }
}

/// HTTP adapter for the catalog API.
///
/// Owns one `reqwest::Client` (and so one connection pool) for its whole
/// lifetime. Dropping the adapter releases the pool.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    http: Client,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(base_url, Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (user agent, proxies, ...).
    pub fn with_http(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// GET `endpoint` with string-encoded query parameters.
    ///
    /// Only a 200 counts as success. Every other outcome, including a body
    /// that is not JSON, comes back as an [`ApiError`].
    pub async fn request(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        tracing::debug!(endpoint = endpoint.path(), ?params, "catalog request");

        let resp = self
            .http
            .get(self.url(endpoint))
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = endpoint.path(), error = %e, "catalog request failed");
                ApiError::from(e)
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            tracing::error!(endpoint = endpoint.path(), status = status.as_u16(), "catalog API error");
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!(endpoint = endpoint.path(), error = %e, "failed to read catalog response");
            ApiError::from(e)
        })?;

        let value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(endpoint = endpoint.path(), error = %e, "catalog response is not JSON");
            ApiError::from(e)
        })?;

        tracing::debug!(endpoint = endpoint.path(), "catalog response received");
        Ok(value)
    }

    /// Like [`request`](Self::request), then deserialize into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value = self.request(endpoint, params).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::warn!(endpoint = endpoint.path(), error = %e, "unexpected catalog payload shape");
            ApiError::from(e)
        })
    }
}
