//! Read-Only Tool Catalog
//!
//! The closed set of data lookups the assistant may request. Every tool is
//! a pure query over the [`DataStore`](crate::DataStore); none of them can
//! change it.
//!
//! The catalog doubles as the function schema offered to the model, so tool
//! descriptions are written for the model, not for humans.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetPriorityBacklog,
    GetThemeReviews,
    GetRegressionThemes,
    GetPersistenceThemes,
    GetThemeSummaryStats,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::GetPriorityBacklog,
        ToolName::GetThemeReviews,
        ToolName::GetRegressionThemes,
        ToolName::GetPersistenceThemes,
        ToolName::GetThemeSummaryStats,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::GetPriorityBacklog => "get_priority_backlog",
            ToolName::GetThemeReviews => "get_theme_reviews",
            ToolName::GetRegressionThemes => "get_regression_themes",
            ToolName::GetPersistenceThemes => "get_persistence_themes",
            ToolName::GetThemeSummaryStats => "get_theme_summary_stats",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    String,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
        }
    }
}

/// One declared tool parameter
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<i64>,
}

/// Tool definition in the catalog
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: ToolName,
    pub description: &'static str,
    pub parameters: &'static [ParamDef],
    /// Natural language description for step output
    pub human_request: &'static str,
}

impl ToolDef {
    /// OpenAI function-tool schema for this definition
    pub fn function_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.parameters {
            let mut property = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let Some(default) = param.default {
                property["default"] = json!(default);
            }
            properties.insert(param.name.to_string(), property);
        }

        let mut parameters = json!({
            "type": "object",
            "properties": properties,
        });
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();
        if !required.is_empty() {
            parameters["required"] = json!(required);
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name.as_str(),
                "description": self.description,
                "parameters": parameters,
            }
        })
    }
}

pub const DEFAULT_BACKLOG_TOP_N: usize = 10;
pub const DEFAULT_REVIEW_LIMIT: usize = 5;

const BACKLOG_PARAMS: &[ParamDef] = &[ParamDef {
    name: "top_n",
    kind: ParamType::Integer,
    description: "Return only the top N themes (default 10).",
    required: false,
    default: Some(DEFAULT_BACKLOG_TOP_N as i64),
}];

const THEME_REVIEW_PARAMS: &[ParamDef] = &[
    ParamDef {
        name: "theme",
        kind: ParamType::String,
        description: "Theme name, e.g. 'Playback Reliability', 'Navigation & Home Feed'.",
        required: true,
        default: None,
    },
    ParamDef {
        name: "version",
        kind: ParamType::String,
        description: "Optional app version to filter by.",
        required: false,
        default: None,
    },
    ParamDef {
        name: "limit",
        kind: ParamType::Integer,
        description: "Max number of reviews to return (default 5).",
        required: false,
        default: Some(DEFAULT_REVIEW_LIMIT as i64),
    },
];

const SUMMARY_PARAMS: &[ParamDef] = &[ParamDef {
    name: "version",
    kind: ParamType::String,
    description: "Optional app version. If not provided, uses latest.",
    required: false,
    default: None,
}];

/// The read-only tool catalog
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDef>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCatalog {
    pub fn new() -> Self {
        let tools = vec![
            ToolDef {
                name: ToolName::GetPriorityBacklog,
                description: "Get the prioritized backlog of themes ranked by RICE score. Use when the user asks what to fix first, priority order, or what to work on next.",
                parameters: BACKLOG_PARAMS,
                human_request: "look up the RICE-ranked backlog",
            },
            ToolDef {
                name: ToolName::GetThemeReviews,
                description: "Get sample user reviews for a specific theme. Use when the user wants quotes, evidence, or what users said about a theme.",
                parameters: THEME_REVIEW_PARAMS,
                human_request: "read the highest-impact reviews for a theme",
            },
            ToolDef {
                name: ToolName::GetRegressionThemes,
                description: "Get themes flagged as regressions (pain increased >5% vs previous release). Use when the user asks what broke, what's new, or what regressed.",
                parameters: &[],
                human_request: "check which themes regressed in the latest release",
            },
            ToolDef {
                name: ToolName::GetPersistenceThemes,
                description: "Get themes flagged as persistent (high pain in 3+ releases). Use when the user asks about long-standing issues or tech debt.",
                parameters: &[],
                human_request: "list long-standing persistent issues",
            },
            ToolDef {
                name: ToolName::GetThemeSummaryStats,
                description: "Get summary stats for all themes (pain share, review count, avg rating) for a version. Use for overview or comparison questions.",
                parameters: SUMMARY_PARAMS,
                human_request: "summarize pain share per theme for a release",
            },
        ];

        Self { tools }
    }

    pub fn get(&self, name: ToolName) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn definitions(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Function schemas in catalog order, as offered to the model
    pub fn function_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDef::function_schema).collect()
    }
}

/// Result from tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was requested, as the model spelled it
    pub tool_name: String,
    /// Structured data, or an error payload
    pub data: Value,
    /// Human-readable one-line summary
    pub human_summary: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(tool: ToolName, data: Value, human_summary: String) -> Self {
        Self {
            tool_name: tool.as_str().to_string(),
            data,
            human_summary,
            success: true,
            error: None,
        }
    }

    /// Failed lookup; `data` is the payload fed back to the model
    pub fn failed(tool_name: &str, error: String, data: Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            human_summary: error.clone(),
            data,
            success: false,
            error: Some(error),
        }
    }

    /// JSON text for the tool-result message
    pub fn to_content(&self) -> String {
        serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| self.data.to_string())
    }
}

/// Result for a tool name outside the catalog
pub fn unknown_tool_result(tool_name: &str) -> ToolResult {
    let error = format!("Unknown tool: {}", tool_name);
    ToolResult::failed(tool_name, error.clone(), json!({ "error": error }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogArgs {
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeReviewArgs {
    pub theme: String,
    pub version: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryArgs {
    pub version: Option<String>,
}

/// A parsed, typed tool request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    PriorityBacklog(BacklogArgs),
    ThemeReviews(ThemeReviewArgs),
    RegressionThemes,
    PersistenceThemes,
    ThemeSummaryStats(SummaryArgs),
}

impl ToolInvocation {
    /// Parse a model tool call. `None` means the name is not in the catalog.
    pub fn parse(name: &str, raw_arguments: &str) -> Option<Self> {
        let tool = ToolName::parse(name)?;
        Some(Self::from_args(tool, &parse_arguments(raw_arguments)))
    }

    /// Build an invocation, substituting defaults for missing or unusable values
    pub fn from_args(tool: ToolName, args: &Map<String, Value>) -> Self {
        match tool {
            ToolName::GetPriorityBacklog => ToolInvocation::PriorityBacklog(BacklogArgs {
                top_n: int_arg(args, "top_n", DEFAULT_BACKLOG_TOP_N),
            }),
            ToolName::GetThemeReviews => ToolInvocation::ThemeReviews(ThemeReviewArgs {
                theme: str_arg(args, "theme").unwrap_or_default(),
                version: str_arg(args, "version"),
                limit: int_arg(args, "limit", DEFAULT_REVIEW_LIMIT),
            }),
            ToolName::GetRegressionThemes => ToolInvocation::RegressionThemes,
            ToolName::GetPersistenceThemes => ToolInvocation::PersistenceThemes,
            ToolName::GetThemeSummaryStats => ToolInvocation::ThemeSummaryStats(SummaryArgs {
                version: str_arg(args, "version"),
            }),
        }
    }

    pub fn tool(&self) -> ToolName {
        match self {
            ToolInvocation::PriorityBacklog(_) => ToolName::GetPriorityBacklog,
            ToolInvocation::ThemeReviews(_) => ToolName::GetThemeReviews,
            ToolInvocation::RegressionThemes => ToolName::GetRegressionThemes,
            ToolInvocation::PersistenceThemes => ToolName::GetPersistenceThemes,
            ToolInvocation::ThemeSummaryStats(_) => ToolName::GetThemeSummaryStats,
        }
    }
}

/// Decode model-supplied argument text. Anything but a JSON object is empty.
pub fn parse_arguments(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(arguments = %other, "tool arguments are not an object, using defaults");
            Map::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "malformed tool arguments, using defaults");
            Map::new()
        }
    }
}

fn int_arg(args: &Map<String, Value>, key: &str, default: usize) -> usize {
    let parsed = match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        _ => None,
    };
    match parsed {
        Some(value) => usize::try_from(value.max(0)).unwrap_or(default),
        None => default,
    }
}

fn str_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match args.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
