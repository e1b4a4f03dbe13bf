//! Tool Executor
//!
//! Runs catalog tools against the data store. Execution never fails: bad
//! names and bad arguments come back as JSON payloads the model can read.

use crate::data_store::DataStore;
use crate::insights::{ranked_backlog, theme_breakdown};
use crate::tools::{
    unknown_tool_result, BacklogArgs, SummaryArgs, ThemeReviewArgs, ToolInvocation, ToolName,
    ToolResult,
};
use crate::types::Review;
use serde_json::{json, Value};
use tracing::debug;

/// Execute a tool call as requested by the model
pub fn execute_tool(name: &str, raw_arguments: &str, store: &DataStore) -> ToolResult {
    match ToolInvocation::parse(name, raw_arguments) {
        Some(invocation) => execute_invocation(&invocation, store),
        None => {
            debug!(tool = name, "model requested an unknown tool");
            unknown_tool_result(name)
        }
    }
}

/// Execute an already-typed invocation
pub fn execute_invocation(invocation: &ToolInvocation, store: &DataStore) -> ToolResult {
    let result = match invocation {
        ToolInvocation::PriorityBacklog(args) => execute_priority_backlog(args, store),
        ToolInvocation::ThemeReviews(args) => execute_theme_reviews(args, store),
        ToolInvocation::RegressionThemes => execute_regression_themes(store),
        ToolInvocation::PersistenceThemes => execute_persistence_themes(store),
        ToolInvocation::ThemeSummaryStats(args) => execute_theme_summary_stats(args, store),
    };
    debug!(
        tool = %invocation.tool(),
        success = result.success,
        summary = %result.human_summary,
        "tool executed"
    );
    result
}

fn execute_priority_backlog(args: &BacklogArgs, store: &DataStore) -> ToolResult {
    let rows: Vec<Value> = ranked_backlog(store.priority())
        .into_iter()
        .take(args.top_n)
        .map(|item| {
            json!({
                "theme": item.theme,
                "priority_score": item.priority_score,
                "reach": item.reach,
                "impact": item.impact,
                "confidence": item.confidence,
                "effort": item.effort,
                "is_regression": item.is_regression,
                "is_persistent": item.is_persistent,
            })
        })
        .collect();

    let human_summary = format!("Top {} of {} backlog themes", rows.len(), store.priority().len());
    ToolResult::ok(ToolName::GetPriorityBacklog, Value::Array(rows), human_summary)
}

/// Resolve a model-supplied theme to a known label.
///
/// Exact (case-sensitive) match wins; otherwise the first label, in order of
/// first appearance, that contains the request case-insensitively. An empty
/// request is contained in every label and resolves to the first one.
pub fn resolve_theme<'a>(requested: &str, known: &[&'a str]) -> Option<&'a str> {
    if let Some(exact) = known.iter().find(|label| **label == requested) {
        return Some(*exact);
    }
    let needle = requested.to_lowercase();
    known
        .iter()
        .find(|label| label.to_lowercase().contains(&needle))
        .copied()
}

fn execute_theme_reviews(args: &ThemeReviewArgs, store: &DataStore) -> ToolResult {
    let known = store.review_themes();
    let Some(theme) = resolve_theme(&args.theme, &known) else {
        let error = format!("No data for theme '{}'", args.theme);
        return ToolResult::failed(
            ToolName::GetThemeReviews.as_str(),
            error.clone(),
            json!({ "error": error, "available_themes": known }),
        );
    };

    let mut matching: Vec<&Review> = store
        .reviews()
        .iter()
        .filter(|r| r.theme() == Some(theme))
        .filter(|r| match &args.version {
            Some(version) => r.version() == Some(version.as_str()),
            None => true,
        })
        .collect();
    matching.sort_by(|a, b| b.final_weight.total_cmp(&a.final_weight));

    let rows: Vec<Value> = matching
        .into_iter()
        .take(args.limit)
        .map(|r| {
            json!({
                "content": r.content,
                "score": f64::from(r.star_score),
                "final_weight": r.final_weight,
            })
        })
        .collect();

    let human_summary = match &args.version {
        Some(version) => format!("{} reviews for '{}' in {}", rows.len(), theme, version),
        None => format!("{} reviews for '{}'", rows.len(), theme),
    };
    ToolResult::ok(ToolName::GetThemeReviews, Value::Array(rows), human_summary)
}

fn execute_regression_themes(store: &DataStore) -> ToolResult {
    let rows: Vec<Value> = match store.latest_signal_version() {
        Some(latest) => store
            .version_signal()
            .iter()
            .filter(|s| s.is_regression && s.app_version == latest)
            .map(|s| {
                json!({
                    "theme": s.theme,
                    "app_version": s.app_version,
                    "normalized_signal": s.normalized_signal,
                    "delta": s.delta,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    let human_summary = format!("{} regressions in the latest release", rows.len());
    ToolResult::ok(ToolName::GetRegressionThemes, Value::Array(rows), human_summary)
}

fn execute_persistence_themes(store: &DataStore) -> ToolResult {
    let rows: Vec<Value> = store
        .persistence()
        .iter()
        .filter(|p| p.is_persistent)
        .map(|p| json!({ "theme": p.theme, "is_persistent": p.is_persistent }))
        .collect();

    let human_summary = format!("{} persistent themes", rows.len());
    ToolResult::ok(ToolName::GetPersistenceThemes, Value::Array(rows), human_summary)
}

fn execute_theme_summary_stats(args: &SummaryArgs, store: &DataStore) -> ToolResult {
    let version = match &args.version {
        Some(version) => Some(version.as_str()),
        None => store.latest_review_version(),
    };

    let rows: Vec<Value> = match version {
        Some(version) => theme_breakdown(store, version)
            .into_iter()
            .map(|b| {
                json!({
                    "theme": b.theme,
                    "total_weight": b.total_weight,
                    "review_count": b.review_count,
                    "avg_rating": b.avg_rating,
                    "pain_share_pct": b.pain_share_pct,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    let human_summary = format!(
        "Summary stats for {} themes in {}",
        rows.len(),
        version.unwrap_or("no release")
    );
    ToolResult::ok(ToolName::GetThemeSummaryStats, Value::Array(rows), human_summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_theme_exact_beats_substring() {
        let known = ["Playback Reliability", "Playback"];
        assert_eq!(resolve_theme("Playback", &known), Some("Playback"));
    }

    #[test]
    fn test_resolve_theme_case_insensitive_substring() {
        let known = ["Navigation & Home Feed", "Playback Reliability"];
        assert_eq!(resolve_theme("playback", &known), Some("Playback Reliability"));
        assert_eq!(resolve_theme("HOME", &known), Some("Navigation & Home Feed"));
        assert_eq!(resolve_theme("Podcasts", &known), None);
    }

    #[test]
    fn test_resolve_theme_first_appearance_wins() {
        let known = ["Ads Frequency", "Ads Relevance"];
        assert_eq!(resolve_theme("ads", &known), Some("Ads Frequency"));
    }

    #[test]
    fn test_resolve_theme_empty_request_takes_first_label() {
        assert_eq!(resolve_theme("", &["Search", "Ads"]), Some("Search"));
        assert_eq!(resolve_theme("", &[]), None);
    }

    #[test]
    fn test_unknown_tool_never_panics() {
        let store = DataStore::default();
        let result = execute_tool("drop_table", "{}", &store);
        assert!(!result.success);
        assert_eq!(result.data["error"], "Unknown tool: drop_table");
    }

    #[test]
    fn test_empty_store_tools_return_empty_lists() {
        let store = DataStore::default();
        for name in ["get_priority_backlog", "get_regression_themes", "get_persistence_themes", "get_theme_summary_stats"] {
            let result = execute_tool(name, "", &store);
            assert!(result.success, "{} failed", name);
            assert_eq!(result.data, json!([]), "{} not empty", name);
        }
    }
}
