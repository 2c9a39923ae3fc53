//! LLM function-calling tools.
//!
//! Each tool name maps to one [`ToolKind`] in a table that is checked against
//! the published definitions when the registry is built. A call always comes
//! back as a string: the verb's JSON output, its flattened failure, or a
//! dispatch error. Nothing escapes [`ToolRegistry::call`], panics included.

use std::collections::HashMap;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use duanju_api::gateway::{EpisodeQuery, RecommendQuery, DEFAULT_RECOMMEND_SIZE};
use duanju_api::{Gateway, GatewayError};
use futures::FutureExt;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetCategories,
    SearchDramas,
    GetCategoryDramas,
    GetRecommendations,
    GetLatestDramas,
    GetDramaEpisodes,
}

impl ToolKind {
    pub const ALL: &[ToolKind] = &[
        Self::GetCategories,
        Self::SearchDramas,
        Self::GetCategoryDramas,
        Self::GetRecommendations,
        Self::GetLatestDramas,
        Self::GetDramaEpisodes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetCategories => "get_categories",
            Self::SearchDramas => "search_dramas",
            Self::GetCategoryDramas => "get_category_dramas",
            Self::GetRecommendations => "get_recommendations",
            Self::GetLatestDramas => "get_latest_dramas",
            Self::GetDramaEpisodes => "get_drama_episodes",
        }
    }

    pub fn definition(self) -> ToolDefinition {
        let (description, parameters) = match self {
            Self::GetCategories => (
                "获取短剧分类列表，返回所有可用的短剧分类",
                json!({ "type": "object", "properties": {}, "required": [] }),
            ),
            Self::SearchDramas => (
                "根据短剧名称搜索短剧",
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "要搜索的短剧名称" }
                    },
                    "required": ["name"]
                }),
            ),
            Self::GetCategoryDramas => (
                "获取指定分类的热门短剧列表",
                json!({
                    "type": "object",
                    "properties": {
                        "category_id": { "type": "integer", "description": "短剧分类ID" },
                        "page": { "type": "integer", "description": "页码，默认为1", "default": 1 }
                    },
                    "required": ["category_id"]
                }),
            ),
            Self::GetRecommendations => (
                "获取推荐短剧",
                json!({
                    "type": "object",
                    "properties": {
                        "category_id": {
                            "type": "integer",
                            "description": "可选的分类ID，不指定则获取全部分类的推荐"
                        },
                        "size": {
                            "type": "integer",
                            "description": "推荐数量，默认10个",
                            "default": DEFAULT_RECOMMEND_SIZE
                        }
                    },
                    "required": []
                }),
            ),
            Self::GetLatestDramas => (
                "获取最新短剧列表",
                json!({
                    "type": "object",
                    "properties": {
                        "page": { "type": "integer", "description": "页码，默认为1", "default": 1 }
                    },
                    "required": []
                }),
            ),
            Self::GetDramaEpisodes => (
                "获取短剧的剧集播放地址",
                json!({
                    "type": "object",
                    "properties": {
                        "drama_id": { "type": "integer", "description": "短剧ID" },
                        "episode": {
                            "type": "integer",
                            "description": "可选的指定集数（从1开始），不指定则获取全部集数"
                        }
                    },
                    "required": ["drama_id"]
                }),
            ),
        };

        ToolDefinition {
            kind: "function",
            function: FunctionSpec {
                name: self.name(),
                description,
                parameters,
            },
        }
    }
}

/// Function-calling tool description, as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("参数错误: {0}")]
    Arguments(#[from] serde_json::Error),

    #[error("短剧名称不能为空")]
    EmptyName,

    #[error("页码和集数必须从1开始")]
    NotPositive,

    #[error("{0}")]
    Panicked(String),
}

// ── Typed arguments ─────────────────────────────────────────────

fn first_page() -> u32 {
    1
}

fn default_size() -> u32 {
    DEFAULT_RECOMMEND_SIZE
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CategoryDramasArgs {
    #[serde(deserialize_with = "lenient")]
    category_id: i64,
    #[serde(default = "first_page", deserialize_with = "lenient")]
    page: u32,
}

#[derive(Debug, Deserialize)]
struct RecommendArgs {
    #[serde(default, deserialize_with = "lenient_opt")]
    category_id: Option<i64>,
    #[serde(default = "default_size", deserialize_with = "lenient")]
    size: u32,
}

#[derive(Debug, Deserialize)]
struct LatestArgs {
    #[serde(default = "first_page", deserialize_with = "lenient")]
    page: u32,
}

#[derive(Debug, Deserialize)]
struct EpisodesArgs {
    #[serde(deserialize_with = "lenient")]
    drama_id: i64,
    #[serde(default, deserialize_with = "lenient_opt")]
    episode: Option<u32>,
}

/// A number, or the same number quoted; models often send `"3"` for `3`.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

impl<T> NumberOrText<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn parse<E: de::Error>(self) -> Result<T, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    NumberOrText::<T>::deserialize(deserializer)?.parse()
}

fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    Option::<NumberOrText<T>>::deserialize(deserializer)?
        .map(NumberOrText::parse)
        .transpose()
}

/// `null` counts as "no arguments".
fn args<T: DeserializeOwned>(arguments: &Value) -> Result<T, ToolError> {
    let value = match arguments {
        Value::Null => json!({}),
        other => other.clone(),
    };
    Ok(serde_json::from_value(value)?)
}

fn positive(n: u32) -> Result<u32, ToolError> {
    if n >= 1 {
        Ok(n)
    } else {
        Err(ToolError::NotPositive)
    }
}

/// Success becomes JSON text, failure its labelled message.
fn flatten<T: Serialize>(result: Result<T, GatewayError>) -> Result<String, ToolError> {
    match result {
        Ok(value) => Ok(serde_json::to_string(&value)?),
        Err(e) => Ok(e.to_string()),
    }
}

// ── Registry ────────────────────────────────────────────────────

pub struct ToolRegistry {
    handlers: HashMap<&'static str, ToolKind>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Build the name table and check it against the definitions.
    pub fn new() -> Result<Self, CoreError> {
        let definitions: Vec<ToolDefinition> =
            ToolKind::ALL.iter().map(|k| k.definition()).collect();

        let mut handlers = HashMap::with_capacity(ToolKind::ALL.len());
        for &kind in ToolKind::ALL {
            if handlers.insert(kind.name(), kind).is_some() {
                return Err(CoreError::Registry(format!(
                    "duplicate tool name {}",
                    kind.name()
                )));
            }
        }

        for def in &definitions {
            match handlers.get(def.function.name) {
                Some(kind) if kind.name() == def.function.name => {}
                _ => {
                    return Err(CoreError::Registry(format!(
                        "tool {} has no handler",
                        def.function.name
                    )))
                }
            }
        }

        tracing::debug!(tools = handlers.len(), "tool registry ready");
        Ok(Self {
            handlers,
            definitions,
        })
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn lookup(&self, name: &str) -> Option<ToolKind> {
        self.handlers.get(name).copied()
    }

    /// Dispatch a tool call. Never fails; every outcome is a string.
    pub async fn call(&self, gateway: &Gateway, name: &str, arguments: &Value) -> String {
        let Some(kind) = self.lookup(name) else {
            tracing::warn!(tool = name, "unknown tool");
            return format!("未知的工具函数: {name}");
        };

        tracing::debug!(tool = name, %arguments, "tool call");
        let outcome = AssertUnwindSafe(invoke(gateway, kind, arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool call failed");
                format!("工具调用异常: {e}")
            }
        }
    }
}

async fn invoke(gateway: &Gateway, kind: ToolKind, arguments: &Value) -> Result<String, ToolError> {
    match kind {
        ToolKind::GetCategories => flatten(gateway.categories().await),
        ToolKind::SearchDramas => {
            let SearchArgs { name } = args(arguments)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ToolError::EmptyName);
            }
            flatten(gateway.search(name).await)
        }
        ToolKind::GetCategoryDramas => {
            let CategoryDramasArgs { category_id, page } = args(arguments)?;
            flatten(gateway.category_dramas(category_id, positive(page)?).await)
        }
        ToolKind::GetRecommendations => {
            let RecommendArgs { category_id, size } = args(arguments)?;
            flatten(gateway.recommendations(RecommendQuery { category_id, size }).await)
        }
        ToolKind::GetLatestDramas => {
            let LatestArgs { page } = args(arguments)?;
            flatten(gateway.latest(positive(page)?).await)
        }
        ToolKind::GetDramaEpisodes => {
            let EpisodesArgs { drama_id, episode } = args(arguments)?;
            let episode = episode.map(positive).transpose()?;
            flatten(gateway.episodes(EpisodeQuery { drama_id, episode }).await)
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during tool call".to_string()
    }
}

#[cfg(test)]
mod tests {
    use duanju_api::CatalogClient;
    use httpmock::prelude::*;

    use super::*;

    fn gateway_for(server: &MockServer) -> Gateway {
        Gateway::new(CatalogClient::new(server.base_url()))
    }

    #[test]
    fn test_registry_covers_every_tool() {
        let registry = ToolRegistry::new().unwrap();
        assert_eq!(registry.definitions().len(), ToolKind::ALL.len());
        for def in registry.definitions() {
            assert_eq!(def.kind, "function");
            assert!(registry.lookup(def.function.name).is_some());
        }
    }

    #[test]
    fn test_definitions_serialize_as_function_calling_schema() {
        let def = serde_json::to_value(ToolKind::GetCategoryDramas.definition()).unwrap();
        assert_eq!(def["type"], "function");
        assert_eq!(def["function"]["name"], "get_category_dramas");
        assert_eq!(def["function"]["parameters"]["required"], json!(["category_id"]));
        assert_eq!(
            def["function"]["parameters"]["properties"]["page"]["default"],
            json!(1)
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_string() {
        let registry = ToolRegistry::new().unwrap();
        let gateway = Gateway::new(CatalogClient::new("http://127.0.0.1:1"));
        let out = registry.call(&gateway, "delete_everything", &json!({})).await;
        assert_eq!(out, "未知的工具函数: delete_everything");
    }

    #[tokio::test]
    async fn test_bad_arguments_are_caught() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({}));
            })
            .await;

        let registry = ToolRegistry::new().unwrap();
        let gateway = gateway_for(&server);

        let out = registry.call(&gateway, "search_dramas", &json!({})).await;
        assert!(out.starts_with("工具调用异常: "), "{out}");

        let out = registry
            .call(&gateway, "get_category_dramas", &json!({ "category_id": "abc" }))
            .await;
        assert!(out.starts_with("工具调用异常: "), "{out}");

        let out = registry
            .call(&gateway, "search_dramas", &json!({ "name": "  " }))
            .await;
        assert_eq!(out, "工具调用异常: 短剧名称不能为空");

        let out = registry
            .call(&gateway, "get_drama_episodes", &json!({ "drama_id": 1, "episode": 0 }))
            .await;
        assert!(out.starts_with("工具调用异常: "), "{out}");

        any.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_search_tool_returns_reshaped_json() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/vod/search").query_param("name", "ceo");
                then.status(200).json_body(json!({
                    "list": [{ "id": 3, "name": "CEO", "cover": "c", "update_time": "t", "score": 9.1 }],
                    "total": 1
                }));
            })
            .await;

        let registry = ToolRegistry::new().unwrap();
        let out = registry
            .call(&gateway_for(&server), "search_dramas", &json!({ "name": "ceo" }))
            .await;

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            json!({
                "total": 1,
                "dramas": [{ "id": 3, "name": "CEO", "cover": "c", "update_time": "t", "score": 9.1 }]
            })
        );
    }

    #[tokio::test]
    async fn test_tool_defaults_and_episode_offset() {
        let server = MockServer::start_async().await;
        let recommend = server
            .mock_async(|when, then| {
                when.method(GET).path("/vod/recommend").query_param("size", "10");
                then.status(200).json_body(json!({ "list": [] }));
            })
            .await;
        let single = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/vod/parse/single")
                    .query_param("id", "8")
                    .query_param("episode", "4");
                then.status(200).json_body(json!({ "label": "第5集", "url": "u" }));
            })
            .await;

        let registry = ToolRegistry::new().unwrap();
        let gateway = gateway_for(&server);

        let out = registry.call(&gateway, "get_recommendations", &Value::Null).await;
        assert_eq!(out, r#"{"list":[]}"#);

        let out = registry
            .call(&gateway, "get_drama_episodes", &json!({ "drama_id": 8, "episode": 5 }))
            .await;
        assert_eq!(out, r#"{"label":"第5集","url":"u"}"#);

        recommend.assert_async().await;
        single.assert_async().await;
    }

    #[tokio::test]
    async fn test_quoted_integer_arguments_are_accepted() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/vod/list")
                    .query_param("categoryId", "3")
                    .query_param("page", "2");
                then.status(200).json_body(json!({ "list": [], "total": 0 }));
            })
            .await;
        let single = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/vod/parse/single")
                    .query_param("id", "8")
                    .query_param("episode", "0");
                then.status(200).json_body(json!({ "label": "第1集", "url": "u" }));
            })
            .await;

        let registry = ToolRegistry::new().unwrap();
        let gateway = gateway_for(&server);

        let out = registry
            .call(&gateway, "get_category_dramas", &json!({ "category_id": "3", "page": "2" }))
            .await;
        assert!(!out.starts_with("工具调用异常"), "{out}");

        let out = registry
            .call(&gateway, "get_drama_episodes", &json!({ "drama_id": " 8 ", "episode": "1" }))
            .await;
        assert_eq!(out, r#"{"label":"第1集","url":"u"}"#);

        let out = registry
            .call(&gateway, "get_latest_dramas", &json!({ "page": "abc" }))
            .await;
        assert!(out.starts_with("工具调用异常: "), "{out}");

        list.assert_async().await;
        single.assert_async().await;
    }

    #[tokio::test]
    async fn test_failures_flatten_to_labelled_string() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(404);
            })
            .await;

        let registry = ToolRegistry::new().unwrap();
        let out = registry
            .call(&gateway_for(&server), "get_latest_dramas", &json!({}))
            .await;
        assert_eq!(out, "获取最新短剧失败: API请求失败: 404");
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
