//! Reply text for chat commands.

use duanju_api::gateway::EpisodeQuery;
use duanju_api::types::{
    CategoryList, CategoryPage, DramaSummary, EpisodeBatch, EpisodeRecord, EpisodeResult,
    SearchResults,
};
use serde_json::Value;

pub fn categories(list: &CategoryList) -> String {
    let mut text = String::from("📺 短剧分类列表：\n\n");
    for cat in &list.categories {
        text.push_str(&format!(
            "🎬 {} (ID: {})\n",
            shown(cat.name.as_ref()).unwrap_or_default(),
            shown(cat.id.as_ref()).unwrap_or_default()
        ));
    }
    text.push_str(&format!("\n共 {} 个分类", list.total));
    text
}

/// Shows the first `limit` results, then a count of the rest.
pub fn search(name: &str, results: &SearchResults, limit: usize) -> String {
    if results.dramas.is_empty() {
        return format!("😔 没有找到包含 '{name}' 的短剧");
    }

    let mut text = format!("🔍 搜索 '{name}' 的结果：\n\n");
    for drama in results.dramas.iter().take(limit) {
        push_drama(&mut text, drama);
    }

    let total = (results.total as usize).max(results.dramas.len());
    if total > limit {
        text.push_str(&format!("... 还有 {} 个结果", total - limit));
    }
    text
}

pub fn category_page(category_id: i64, page: &CategoryPage) -> String {
    if page.dramas.is_empty() {
        return format!("😔 分类 {category_id} 下暂无短剧");
    }

    let mut text = format!(
        "📂 分类 {category_id} 的短剧 (第 {}/{} 页)：\n\n",
        page.current_page, page.total_pages
    );
    for drama in &page.dramas {
        push_drama(&mut text, drama);
    }
    text.push_str(&format!("共 {} 部短剧", page.total));
    text
}

pub fn recommendations(payload: &Value) -> String {
    format!("🌟 为您推荐的短剧：\n\n{}", pretty(payload))
}

pub fn latest(payload: &Value) -> String {
    format!("🆕 最新短剧：\n\n{}", pretty(payload))
}

/// Falls back to the raw payload when it is neither a single record nor a
/// series batch.
pub fn episodes(query: &EpisodeQuery, payload: &Value, limit: usize) -> String {
    match EpisodeResult::from_payload(payload) {
        Some(EpisodeResult::Single(record)) => single_episode(query, &record),
        Some(EpisodeResult::Batch(batch)) => episode_batch(query.drama_id, &batch, limit),
        None => payload.to_string(),
    }
}

fn single_episode(query: &EpisodeQuery, record: &EpisodeRecord) -> String {
    let mut text = match query.episode {
        Some(n) => format!("🎬 短剧 {} 第 {n} 集：\n\n", query.drama_id),
        None => format!("🎬 短剧 {}：\n\n", query.drama_id),
    };
    text.push_str(&format!(
        "📺 {}\n🔗 {}\n📁 格式: {}",
        record.label,
        record.url,
        record.file_type.as_deref().unwrap_or("未知")
    ));
    text
}

/// Lists the first `limit` resolved entries; failed ones only count.
fn episode_batch(drama_id: i64, batch: &EpisodeBatch, limit: usize) -> String {
    let resolved: Vec<_> = batch.resolved().collect();
    if resolved.is_empty() {
        return format!(
            "😔 短剧 {drama_id} 暂无可用的播放地址 (共 {} 集，失败 {} 集)",
            batch.total_episodes, batch.fail_count
        );
    }

    let mut text = format!(
        "📺 短剧 {drama_id} 全集播放地址 (共 {} 集，成功 {} 集，失败 {} 集)：\n\n",
        batch.total_episodes, batch.success_count, batch.fail_count
    );
    if let Some(description) = batch.description.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!("ℹ️ {description}\n\n"));
    }
    for entry in resolved.iter().take(limit) {
        text.push_str(&format!(
            "🎬 {}\n🔗 {}\n\n",
            entry.label,
            entry.url.as_deref().unwrap_or_default()
        ));
    }
    if resolved.len() > limit {
        text.push_str(&format!("... 还有 {} 集", resolved.len() - limit));
    }
    text.trim_end().to_string()
}

fn push_drama(text: &mut String, drama: &DramaSummary) {
    let unknown = || "未知".to_string();
    text.push_str(&format!(
        "🎬 {}\n   📊 评分: {}\n   🆔 ID: {}\n   📅 更新: {}\n\n",
        shown(drama.name.as_ref()).unwrap_or_else(unknown),
        shown(drama.score.as_ref()).unwrap_or_else(|| "暂无".to_string()),
        shown(drama.id.as_ref()).unwrap_or_else(unknown),
        shown(drama.update_time.as_ref()).unwrap_or_else(unknown),
    ));
}

/// Strings print bare; `null` counts as absent.
fn shown(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
