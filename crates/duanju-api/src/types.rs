use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Normalized shapes ───────────────────────────────────────────

/// Fields are copied as the server sent them; a missing or `null` field is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<Value>,
    pub name: Option<Value>,
}

/// One drama row from a search or listing.
///
/// Rows are taken field by field without type checks, so one odd row never
/// fails the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramaSummary {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub cover: Option<Value>,
    #[serde(default)]
    pub update_time: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<Category>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub total: u64,
    pub dramas: Vec<DramaSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPage {
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub dramas: Vec<DramaSummary>,
}

// ── Raw catalog responses ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub type_id: Option<Value>,
    #[serde(default)]
    pub type_name: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<RawCategory>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DramaListResponse {
    #[serde(default)]
    pub list: Vec<DramaSummary>,
    #[serde(default)]
    pub total: u64,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl CategoriesResponse {
    pub fn into_category_list(self) -> CategoryList {
        CategoryList {
            categories: self
                .categories
                .into_iter()
                .map(|c| Category {
                    id: c.type_id,
                    name: c.type_name,
                })
                .collect(),
            total: self.total,
        }
    }
}

impl DramaListResponse {
    pub fn into_search_results(self) -> SearchResults {
        SearchResults {
            total: self.total,
            dramas: self.list,
        }
    }

    /// `requested_page` fills in a missing `currentPage`.
    pub fn into_category_page(self, requested_page: u32) -> CategoryPage {
        CategoryPage {
            total: self.total,
            current_page: self.current_page.unwrap_or(requested_page),
            total_pages: self.total_pages.unwrap_or(1),
            dramas: self.list,
        }
    }
}

// ── Episodes ────────────────────────────────────────────────────

/// A resolved play address for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(alias = "name", alias = "title")]
    pub label: String,
    #[serde(alias = "parsedUrl", alias = "playUrl")]
    pub url: String,
    #[serde(rename = "fileType", alias = "file_type", default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeEntry {
    #[serde(alias = "name", alias = "title", default)]
    pub label: String,
    #[serde(alias = "parsedUrl", alias = "playUrl", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl EpisodeEntry {
    pub fn is_resolved(&self) -> bool {
        let has_url = self.url.as_deref().is_some_and(|u| !u.is_empty());
        has_url && matches!(self.status.as_str(), "" | "success" | "ok")
    }
}

/// The outcome of resolving every episode of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeBatch {
    #[serde(alias = "total", default)]
    pub total_episodes: u32,
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub fail_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "results", alias = "episodes", default)]
    pub entries: Vec<EpisodeEntry>,
}

impl EpisodeBatch {
    /// Fill counts the payload left out from the entries themselves.
    fn normalize(mut self) -> Self {
        if self.total_episodes == 0 {
            self.total_episodes = self.entries.len() as u32;
        }
        if self.success_count == 0 && self.fail_count == 0 && !self.entries.is_empty() {
            let ok = self.entries.iter().filter(|e| e.is_resolved()).count() as u32;
            self.success_count = ok;
            self.fail_count = self.entries.len() as u32 - ok;
        }
        self
    }

    pub fn resolved(&self) -> impl Iterator<Item = &EpisodeEntry> {
        self.entries.iter().filter(|e| e.is_resolved())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EpisodeResult {
    Single(EpisodeRecord),
    Batch(EpisodeBatch),
}

impl EpisodeResult {
    /// Interpret a parse-endpoint payload.
    ///
    /// The record may sit at the top level, under `data`, or under
    /// `data.episode`. Returns `None` when neither shape matches.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let body = match payload.get("data") {
            Some(data) if data.is_object() => data,
            _ => payload,
        };

        let has_list = ["entries", "results", "episodes"]
            .iter()
            .any(|k| body.get(k).is_some_and(Value::is_array));
        if has_list || body.get("totalEpisodes").is_some() {
            return EpisodeBatch::deserialize(body)
                .ok()
                .map(|b| Self::Batch(b.normalize()));
        }

        let record = body
            .get("episode")
            .filter(|e| e.is_object())
            .unwrap_or(body);
        EpisodeRecord::deserialize(record).ok().map(Self::Single)
    }
}
