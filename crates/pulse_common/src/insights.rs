//! Dashboard insights
//!
//! The numbers behind each report page: executive summary, release health,
//! roadmap, trends and theme deep dive. Also the per-theme breakdown the
//! summary-stats tool returns.

use crate::data_store::DataStore;
use crate::error::PulseError;
use crate::types::{compare_versions, PriorityItem, Review, VersionSignal};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Star ratings at or below this count as critical
pub const CRITICAL_RATING: u8 = 2;

/// Number of themes the trends report shows when none are requested
pub const DEFAULT_TREND_THEMES: usize = 3;

/// Sidebar-style totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    pub total_reviews: usize,
    pub app_versions: usize,
    pub theme_categories: usize,
}

pub fn quick_stats(store: &DataStore) -> QuickStats {
    QuickStats {
        total_reviews: store.reviews().len(),
        app_versions: store.review_versions().len(),
        theme_categories: store.review_themes().len(),
    }
}

/// Aggregate for one theme within one release
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeBreakdown {
    pub theme: String,
    pub total_weight: f64,
    pub review_count: usize,
    /// NaN only when the group is empty, which `theme_breakdown` never emits
    pub avg_rating: f64,
    /// Share of the release's total weight, rounded to 2 decimals
    pub pain_share_pct: f64,
}

/// Per-theme totals for `version`, sorted by theme label
pub fn theme_breakdown(store: &DataStore, version: &str) -> Vec<ThemeBreakdown> {
    let mut groups: BTreeMap<&str, (f64, usize, u64)> = BTreeMap::new();
    for review in store.reviews_for_version(version) {
        let Some(theme) = review.theme() else {
            continue;
        };
        let entry = groups.entry(theme).or_insert((0.0, 0, 0));
        entry.0 += review.final_weight;
        entry.1 += 1;
        entry.2 += u64::from(review.star_score);
    }

    let total: f64 = groups.values().map(|(weight, _, _)| weight).sum();

    groups
        .into_iter()
        .map(|(theme, (weight, count, stars))| ThemeBreakdown {
            theme: theme.to_string(),
            total_weight: weight,
            review_count: count,
            avg_rating: stars as f64 / count as f64,
            pain_share_pct: if total > 0.0 {
                round2(100.0 * weight / total)
            } else {
                0.0
            },
        })
        .collect()
}

/// Pain total for one theme, used in ranked lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemePain {
    pub theme: String,
    pub pain: f64,
    pub share_pct: f64,
}

/// Themes by pain, highest first
pub fn pain_by_theme(store: &DataStore, version: &str) -> Vec<ThemePain> {
    let mut ranked: Vec<ThemePain> = theme_breakdown(store, version)
        .into_iter()
        .map(|b| ThemePain {
            theme: b.theme,
            pain: b.total_weight,
            share_pct: b.pain_share_pct,
        })
        .collect();
    ranked.sort_by(|a, b| b.pain.total_cmp(&a.pain));
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub version: String,
    pub total_reviews: usize,
    pub avg_rating: Option<f64>,
    pub total_pain: f64,
    pub top_theme: Option<String>,
    pub pain_by_theme: Vec<ThemePain>,
    pub rating_distribution: BTreeMap<u8, usize>,
    pub critical_reviews: usize,
    pub critical_share_pct: f64,
}

/// Snapshot of the latest release. `None` when no review carries a version.
pub fn executive_summary(store: &DataStore) -> Option<ExecutiveSummary> {
    let version = store.latest_review_version()?;
    let reviews: Vec<&Review> = store.reviews_for_version(version).collect();
    let pain = pain_by_theme(store, version);
    let critical = reviews
        .iter()
        .filter(|r| r.star_score <= CRITICAL_RATING)
        .count();

    Some(ExecutiveSummary {
        version: version.to_string(),
        total_reviews: reviews.len(),
        avg_rating: mean_rating(&reviews),
        total_pain: reviews.iter().map(|r| r.final_weight).sum(),
        top_theme: pain.first().map(|p| p.theme.clone()),
        rating_distribution: rating_distribution(&reviews),
        critical_reviews: critical,
        critical_share_pct: percent(critical, reviews.len()),
        pain_by_theme: pain,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionPain {
    pub version: String,
    pub pain_by_theme: Vec<ThemePain>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseHealth {
    pub version: String,
    pub reviews: usize,
    pub avg_rating: Option<f64>,
    pub pain_score: f64,
    pub themes: Vec<ThemePain>,
    pub previous: Option<VersionPain>,
}

/// Diagnostic view of one release, latest by default.
///
/// The comparison release is the next-older one when `version` is the
/// latest, otherwise the latest.
pub fn release_health(store: &DataStore, version: Option<&str>) -> Result<ReleaseHealth, PulseError> {
    let mut versions = store.review_versions();
    versions.reverse();

    let selected = match version {
        Some(v) => *versions
            .iter()
            .find(|known| **known == v)
            .ok_or_else(|| PulseError::UnknownVersion(v.to_string()))?,
        None => *versions
            .first()
            .ok_or_else(|| PulseError::UnknownVersion("latest".to_string()))?,
    };

    let reviews: Vec<&Review> = store.reviews_for_version(selected).collect();

    let previous = if versions.len() > 1 {
        let prev = if versions[0] == selected {
            versions[1]
        } else {
            versions[0]
        };
        Some(VersionPain {
            version: prev.to_string(),
            pain_by_theme: pain_by_theme(store, prev),
        })
    } else {
        None
    };

    Ok(ReleaseHealth {
        version: selected.to_string(),
        reviews: reviews.len(),
        avg_rating: mean_rating(&reviews),
        pain_score: reviews.iter().map(|r| r.final_weight).sum(),
        themes: pain_by_theme(store, selected),
        previous,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapOverview {
    pub total_themes: usize,
    pub persistent_count: usize,
    pub regression_count: usize,
    pub avg_effort: Option<f64>,
    /// Backlog by priority score, highest first; ties keep file order
    pub ranked: Vec<PriorityItem>,
    pub effort_distribution: BTreeMap<u8, usize>,
}

pub fn roadmap_overview(store: &DataStore) -> RoadmapOverview {
    let backlog = store.priority();
    let mut effort_distribution = BTreeMap::new();
    for item in backlog {
        *effort_distribution.entry(item.effort).or_insert(0) += 1;
    }

    RoadmapOverview {
        total_themes: backlog.len(),
        persistent_count: backlog.iter().filter(|i| i.is_persistent).count(),
        regression_count: backlog.iter().filter(|i| i.is_regression).count(),
        avg_effort: if backlog.is_empty() {
            None
        } else {
            Some(backlog.iter().map(|i| f64::from(i.effort)).sum::<f64>() / backlog.len() as f64)
        },
        ranked: ranked_backlog(backlog),
        effort_distribution,
    }
}

/// Stable descending sort by priority score
pub fn ranked_backlog(backlog: &[PriorityItem]) -> Vec<PriorityItem> {
    let mut ranked = backlog.to_vec();
    ranked.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    ranked
}

/// Write the ranked backlog in the dashboard's export layout
pub fn write_backlog_csv<W: Write>(ranked: &[PriorityItem], writer: W) -> Result<(), PulseError> {
    let csv_error = |e: csv::Error| PulseError::Io(std::io::Error::other(e.to_string()));
    let mut out = csv::Writer::from_writer(writer);
    for item in ranked {
        out.serialize(item).map_err(csv_error)?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeTrend {
    pub theme: String,
    /// Oldest release first
    pub points: Vec<VersionSignal>,
}

/// Version series for each requested theme; unknown themes yield no entry
pub fn theme_trends(store: &DataStore, themes: &[String]) -> Vec<ThemeTrend> {
    themes
        .iter()
        .filter_map(|theme| {
            let mut points: Vec<VersionSignal> = store
                .version_signal()
                .iter()
                .filter(|s| &s.theme == theme)
                .cloned()
                .collect();
            if points.is_empty() {
                return None;
            }
            points.sort_by(|a, b| compare_versions(&a.app_version, &b.app_version));
            Some(ThemeTrend {
                theme: theme.clone(),
                points,
            })
        })
        .collect()
}

/// First themes alphabetically from the version-signal table
pub fn default_trend_themes(store: &DataStore) -> Vec<String> {
    let mut themes: Vec<String> = store
        .version_signal()
        .iter()
        .map(|s| s.theme.clone())
        .collect();
    themes.sort();
    themes.dedup();
    themes.truncate(DEFAULT_TREND_THEMES);
    themes
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepDive {
    pub theme: String,
    pub version: String,
    pub total_reviews: usize,
    pub avg_rating: Option<f64>,
    pub total_pain: f64,
    pub persistent: bool,
    /// Highest pain weight first
    pub reviews: Vec<Review>,
    pub rating_distribution: BTreeMap<u8, usize>,
}

/// Raw evidence for one theme in one release (latest by default)
pub fn deep_dive(
    store: &DataStore,
    theme: &str,
    version: Option<&str>,
    limit: usize,
) -> Result<DeepDive, PulseError> {
    if !store.review_themes().contains(&theme) {
        return Err(PulseError::UnknownTheme(theme.to_string()));
    }
    let version = match version {
        Some(v) => v,
        None => store
            .latest_review_version()
            .ok_or_else(|| PulseError::UnknownVersion("latest".to_string()))?,
    };

    let mut selection: Vec<&Review> = store
        .reviews_for_version(version)
        .filter(|r| r.theme() == Some(theme))
        .collect();
    selection.sort_by(|a, b| b.final_weight.total_cmp(&a.final_weight));

    Ok(DeepDive {
        theme: theme.to_string(),
        version: version.to_string(),
        total_reviews: selection.len(),
        avg_rating: mean_rating(&selection),
        total_pain: selection.iter().map(|r| r.final_weight).sum(),
        persistent: store.is_persistent(theme),
        rating_distribution: rating_distribution(&selection),
        reviews: selection.into_iter().take(limit).cloned().collect(),
    })
}

fn mean_rating(reviews: &[&Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let stars: u64 = reviews.iter().map(|r| u64::from(r.star_score)).sum();
    Some(stars as f64 / reviews.len() as f64)
}

fn rating_distribution(reviews: &[&Review]) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.star_score).or_insert(0) += 1;
    }
    counts
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PersistenceFlag;
    use approx::assert_relative_eq;

    fn review(id: &str, version: &str, theme: &str, stars: u8, weight: f64) -> Review {
        Review {
            id: id.to_string(),
            app_version: Some(version.to_string()),
            theme_label: Some(theme.to_string()),
            star_score: stars,
            content: format!("review {}", id),
            final_weight: weight,
        }
    }

    fn backlog_item(theme: &str, score: f64, effort: u8, persistent: bool, regression: bool) -> PriorityItem {
        PriorityItem {
            theme: theme.to_string(),
            priority_score: score,
            reach: 0.5,
            impact: 1.0,
            confidence: 0.8,
            effort,
            is_persistent: persistent,
            is_regression: regression,
        }
    }

    fn store() -> DataStore {
        DataStore::new(
            vec![
                review("1", "8.9", "Playback", 1, 4.0),
                review("2", "8.9", "Ads", 2, 1.0),
                review("3", "8.10", "Playback", 1, 3.0),
                review("4", "8.10", "Ads", 5, 1.0),
                review("5", "8.10", "Playback", 4, 2.0),
                review("6", "8.8", "Search", 3, 1.5),
            ],
            vec![
                backlog_item("Playback", 2.0, 3, true, false),
                backlog_item("Ads", 0.5, 1, false, true),
                backlog_item("Search", 2.0, 5, false, false),
            ],
            vec![PersistenceFlag {
                theme: "Playback".to_string(),
                is_persistent: true,
            }],
            vec![],
        )
    }

    #[test]
    fn test_theme_breakdown_shares() {
        let breakdown = theme_breakdown(&store(), "8.10");
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].theme, "Ads");
        assert_eq!(breakdown[1].theme, "Playback");
        assert_eq!(breakdown[1].review_count, 2);
        assert_relative_eq!(breakdown[1].total_weight, 5.0);
        assert_relative_eq!(breakdown[1].avg_rating, 2.5);
        assert_relative_eq!(breakdown[1].pain_share_pct, 83.33);
        assert_relative_eq!(breakdown[0].pain_share_pct, 16.67);
    }

    #[test]
    fn test_executive_summary_latest_release() {
        let summary = executive_summary(&store()).unwrap();
        assert_eq!(summary.version, "8.10");
        assert_eq!(summary.total_reviews, 3);
        assert_eq!(summary.top_theme.as_deref(), Some("Playback"));
        assert_eq!(summary.critical_reviews, 1);
        assert_relative_eq!(summary.critical_share_pct, 100.0 / 3.0);
        assert_relative_eq!(summary.avg_rating.unwrap(), 10.0 / 3.0);
        assert_relative_eq!(summary.total_pain, 6.0);
        assert_eq!(summary.rating_distribution.get(&1), Some(&1));
        assert_eq!(summary.rating_distribution.get(&3), None);
    }

    #[test]
    fn test_release_health_previous_version() {
        let store = store();

        let latest = release_health(&store, None).unwrap();
        assert_eq!(latest.version, "8.10");
        assert_eq!(latest.previous.as_ref().unwrap().version, "8.9");

        let older = release_health(&store, Some("8.8")).unwrap();
        assert_eq!(older.previous.unwrap().version, "8.10");
        assert_eq!(older.reviews, 1);

        assert!(matches!(
            release_health(&store, Some("1.0")),
            Err(PulseError::UnknownVersion(_))
        ));
    }

    #[test]
    fn test_roadmap_overview() {
        let overview = roadmap_overview(&store());
        assert_eq!(overview.total_themes, 3);
        assert_eq!(overview.persistent_count, 1);
        assert_eq!(overview.regression_count, 1);
        assert_relative_eq!(overview.avg_effort.unwrap(), 3.0);
        let order: Vec<&str> = overview.ranked.iter().map(|i| i.theme.as_str()).collect();
        assert_eq!(order, vec!["Playback", "Search", "Ads"]);
        assert_eq!(overview.effort_distribution.get(&5), Some(&1));
    }

    #[test]
    fn test_backlog_export_uses_source_headers() {
        let overview = roadmap_overview(&store());
        let mut buffer = Vec::new();
        write_backlog_csv(&overview.ranked, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("theme,Priority_Score,Reach,Impact,Confidence,Effort,Is_Persistent,Is_Regression")
        );
        assert!(lines.next().unwrap().starts_with("Playback,2.0,"));
    }

    #[test]
    fn test_deep_dive_selection() {
        let dive = deep_dive(&store(), "Playback", None, 1).unwrap();
        assert_eq!(dive.version, "8.10");
        assert_eq!(dive.total_reviews, 2);
        assert_eq!(dive.reviews.len(), 1);
        assert_eq!(dive.reviews[0].id, "3");
        assert!(dive.persistent);

        let empty = deep_dive(&store(), "Search", Some("8.10"), 10).unwrap();
        assert_eq!(empty.total_reviews, 0);
        assert!(empty.avg_rating.is_none());

        assert!(matches!(
            deep_dive(&store(), "Lyrics", None, 10),
            Err(PulseError::UnknownTheme(_))
        ));
    }
}
