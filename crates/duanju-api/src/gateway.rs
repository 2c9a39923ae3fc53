//! The six catalog verbs.
//!
//! Every verb builds its query, calls the adapter once and reshapes the
//! payload. Failures come back as [`GatewayError`], which knows the verb's
//! user-facing label; flattening to text is left to the caller.

use serde_json::Value;

use crate::client::{CatalogClient, Endpoint};
use crate::error::{ApiError, GatewayError};
use crate::types::{CategoriesResponse, CategoryList, CategoryPage, DramaListResponse, SearchResults};

pub const DEFAULT_RECOMMEND_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Categories,
    Search,
    CategoryDramas,
    Recommendations,
    Latest,
    Episodes,
}

impl Verb {
    pub const ALL: &[Verb] = &[
        Self::Categories,
        Self::Search,
        Self::CategoryDramas,
        Self::Recommendations,
        Self::Latest,
        Self::Episodes,
    ];

    /// Prefix of the message shown when this verb fails.
    pub fn failure_label(self) -> &'static str {
        match self {
            Self::Categories => "获取分类失败",
            Self::Search => "搜索失败",
            Self::CategoryDramas => "获取分类短剧失败",
            Self::Recommendations => "获取推荐失败",
            Self::Latest => "获取最新短剧失败",
            Self::Episodes => "获取剧集信息失败",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Search => "search",
            Self::CategoryDramas => "category_dramas",
            Self::Recommendations => "recommendations",
            Self::Latest => "latest",
            Self::Episodes => "episodes",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Query for the recommend endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendQuery {
    pub category_id: Option<i64>,
    pub size: u32,
}

impl Default for RecommendQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            size: DEFAULT_RECOMMEND_SIZE,
        }
    }
}

impl RecommendQuery {
    /// `categoryId` is left out entirely when no category was given.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("size", self.size.to_string())];
        if let Some(id) = self.category_id {
            params.push(("categoryId", id.to_string()));
        }
        params
    }
}

/// Query for the two parse endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeQuery {
    pub drama_id: i64,
    /// 1-based, as shown to users. `None` asks for the whole series.
    pub episode: Option<u32>,
}

impl EpisodeQuery {
    pub fn endpoint(&self) -> Endpoint {
        match self.episode {
            Some(_) => Endpoint::ParseSingle,
            None => Endpoint::ParseAll,
        }
    }

    /// The remote API counts episodes from zero.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("id", self.drama_id.to_string())];
        if let Some(episode) = self.episode {
            params.push(("episode", episode.saturating_sub(1).to_string()));
        }
        params
    }
}

/// Catalog verbs over an owned [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct Gateway {
    client: CatalogClient,
}

impl Gateway {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub async fn categories(&self) -> Result<CategoryList, GatewayError> {
        let resp: CategoriesResponse = self
            .client
            .request_as(Endpoint::Categories, &[])
            .await
            .map_err(fail(Verb::Categories))?;
        Ok(resp.into_category_list())
    }

    /// Callers reject blank names before getting here.
    pub async fn search(&self, name: &str) -> Result<SearchResults, GatewayError> {
        let resp: DramaListResponse = self
            .client
            .request_as(Endpoint::Search, &[("name", name.to_string())])
            .await
            .map_err(fail(Verb::Search))?;
        Ok(resp.into_search_results())
    }

    pub async fn category_dramas(
        &self,
        category_id: i64,
        page: u32,
    ) -> Result<CategoryPage, GatewayError> {
        let params = [
            ("categoryId", category_id.to_string()),
            ("page", page.to_string()),
        ];
        let resp: DramaListResponse = self
            .client
            .request_as(Endpoint::List, &params)
            .await
            .map_err(fail(Verb::CategoryDramas))?;
        Ok(resp.into_category_page(page))
    }

    pub async fn recommendations(&self, query: RecommendQuery) -> Result<Value, GatewayError> {
        self.client
            .request(Endpoint::Recommend, &query.params())
            .await
            .map_err(fail(Verb::Recommendations))
    }

    pub async fn latest(&self, page: u32) -> Result<Value, GatewayError> {
        self.client
            .request(Endpoint::Latest, &[("page", page.to_string())])
            .await
            .map_err(fail(Verb::Latest))
    }

    /// Raw parse payload; see [`EpisodeResult::from_payload`](crate::types::EpisodeResult::from_payload)
    /// for the structured view.
    pub async fn episodes(&self, query: EpisodeQuery) -> Result<Value, GatewayError> {
        self.client
            .request(query.endpoint(), &query.params())
            .await
            .map_err(fail(Verb::Episodes))
    }
}

fn fail(verb: Verb) -> impl FnOnce(ApiError) -> GatewayError {
    move |source| {
        tracing::warn!(verb = verb.name(), error = %source, "catalog verb failed");
        GatewayError::new(verb, source)
    }
}
