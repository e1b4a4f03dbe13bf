//! Row types for the four precomputed tables.
//!
//! Column names follow the CSVs produced by the offline labeling pipeline,
//! which is why the serde renames look inconsistent.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// One labeled user review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "review_id")]
    pub id: String,
    #[serde(rename = "RC_ver", default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub theme_label: Option<String>,
    /// Star rating, 1-5
    #[serde(rename = "score", deserialize_with = "flexible_u8")]
    pub star_score: u8,
    #[serde(default)]
    pub content: String,
    /// Severity-weighted pain contribution
    pub final_weight: f64,
}

impl Review {
    pub fn theme(&self) -> Option<&str> {
        self.theme_label.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.app_version.as_deref()
    }
}

/// One RICE-scored backlog row, one per theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityItem {
    pub theme: String,
    #[serde(rename = "Priority_Score")]
    pub priority_score: f64,
    #[serde(rename = "Reach")]
    pub reach: f64,
    #[serde(rename = "Impact")]
    pub impact: f64,
    #[serde(rename = "Confidence")]
    pub confidence: f64,
    #[serde(rename = "Effort", deserialize_with = "flexible_u8")]
    pub effort: u8,
    #[serde(rename = "Is_Persistent", deserialize_with = "flexible_bool")]
    pub is_persistent: bool,
    #[serde(rename = "Is_Regression", deserialize_with = "flexible_bool")]
    pub is_regression: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceFlag {
    pub theme: String,
    #[serde(rename = "Is_Persistent", deserialize_with = "flexible_bool")]
    pub is_persistent: bool,
}

/// A theme's share of pain in one release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSignal {
    pub theme: String,
    #[serde(rename = "RC_ver")]
    pub app_version: String,
    #[serde(rename = "Normalized_Signal")]
    pub normalized_signal: f64,
    #[serde(rename = "Review_Count", default, deserialize_with = "flexible_u32")]
    pub review_count: u32,
    #[serde(rename = "Avg_Rating", default)]
    pub avg_rating: Option<f64>,
    /// Change vs the previous release; empty for a theme's first release
    #[serde(rename = "Delta", default)]
    pub delta: Option<f64>,
    #[serde(rename = "Is_Regression", deserialize_with = "flexible_bool")]
    pub is_regression: bool,
}

/// Compare two app versions segment by segment.
///
/// Numeric segments compare as numbers so "8.10" sorts after "8.9"; anything
/// else falls back to string order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.trim().parse::<u64>(), r.trim().parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Parse the boolean spellings CSV exporters and spreadsheets emit
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" | "y" => Some(true),
        "false" | "0" | "0.0" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

/// Whole numbers sometimes arrive as "4.0" from float-typed columns
fn parse_whole(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => {
            Some(value as u64)
        }
        _ => None,
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean '{}'", raw)))
}

fn flexible_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_whole(&raw)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid integer '{}'", raw)))
}

fn flexible_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Ok(0);
    }
    parse_whole(&raw)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid integer '{}'", raw)))
}
