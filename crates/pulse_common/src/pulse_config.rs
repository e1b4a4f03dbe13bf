//! ReleasePulse Configuration
//!
//! Config file: ~/.config/releasepulse/config.toml or /etc/releasepulse/config.toml

use crate::llm_client::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "PULSE_DATA_DIR";

/// Color display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    /// Force basic ANSI colors
    Basic,
    /// No colors (plain text)
    None,
}

/// Where the four CSV tables live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_reviews_file")]
    pub reviews_file: String,
    #[serde(default = "default_priority_file")]
    pub priority_file: String,
    #[serde(default = "default_persistence_file")]
    pub persistence_file: String,
    #[serde(default = "default_version_signal_file")]
    pub version_signal_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_reviews_file() -> String {
    "spotify_reviews_multilabel.csv".to_string()
}

fn default_priority_file() -> String {
    "priority_backlog.csv".to_string()
}

fn default_persistence_file() -> String {
    "theme_persistence.csv".to_string()
}

fn default_version_signal_file() -> String {
    "theme_version_signal.csv".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            reviews_file: default_reviews_file(),
            priority_file: default_priority_file(),
            persistence_file: default_persistence_file(),
            version_signal_file: default_version_signal_file(),
        }
    }
}

impl DataConfig {
    /// Data directory, honoring $PULSE_DATA_DIR
    pub fn resolved_dir(&self) -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self.dir.clone(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,
}

/// Developer/debug configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    /// Print each model call and tool execution while the assistant works
    /// Can also be enabled via PULSE_SHOW_STEPS=1
    #[serde(default)]
    pub show_steps: bool,

    /// Show how long each assistant answer took
    #[serde(default)]
    pub show_timing: bool,
}

impl DevConfig {
    pub fn should_show_steps(&self) -> bool {
        self.show_steps
            || std::env::var("PULSE_SHOW_STEPS").map(|v| v == "1").unwrap_or(false)
    }
}

/// Main ReleasePulse configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

impl PulseConfig {
    /// Directory holding user config and secrets: ~/.config/releasepulse
    pub fn user_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("releasepulse"))
    }

    /// Get default user config path: ~/.config/releasepulse/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        Self::user_config_dir()
            .map(|dir| dir.join("config.toml"))
            .context("Cannot determine config directory")
    }

    /// Get system config path: /etc/releasepulse/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/releasepulse/config.toml")
    }

    /// Deployment secret store: ~/.config/releasepulse/secrets.toml
    pub fn secrets_path() -> Option<PathBuf> {
        Self::user_config_dir().map(|dir| dir.join("secrets.toml"))
    }

    /// Load configuration from file
    ///
    /// Priority:
    /// 1. User config (~/.config/releasepulse/config.toml)
    /// 2. System config (/etc/releasepulse/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from(&system_path);
        }

        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: PulseConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::user_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Apply a `key=value` setting
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", assignment))?;
        let value = value.trim();

        match key.trim() {
            "output.color" => self.set_color_mode(value)?,
            "data.dir" => self.data.dir = PathBuf::from(value),
            "llm.enabled" => self.llm.enabled = parse_bool_setting(value)?,
            "llm.endpoint" => self.llm.endpoint = value.trim_end_matches('/').to_string(),
            "llm.model" => self.llm.model = value.to_string(),
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: '{}'", value))?
            }
            "dev.show_steps" => self.dev.show_steps = parse_bool_setting(value)?,
            "dev.show_timing" => self.dev.show_timing = parse_bool_setting(value)?,
            other => anyhow::bail!("Unknown setting: '{}'", other),
        }
        Ok(())
    }

    /// Set output color mode
    pub fn set_color_mode(&mut self, mode: &str) -> Result<()> {
        self.output.color = match mode.to_lowercase().as_str() {
            "auto" => ColorMode::Auto,
            "basic" | "on" => ColorMode::Basic,
            "none" | "off" | "disabled" => ColorMode::None,
            _ => anyhow::bail!("Invalid color mode: '{}'. Valid values: auto, basic, none", mode),
        };
        Ok(())
    }
}

fn parse_bool_setting(value: &str) -> Result<bool> {
    crate::types::parse_flag(value)
        .with_context(|| format!("Invalid boolean: '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PulseConfig::default();
        assert_eq!(config.output.color, ColorMode::Auto);
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.data.priority_file, "priority_backlog.csv");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(!config.dev.show_steps);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: PulseConfig = toml::from_str(
            r#"
            [llm]
            model = "gpt-4o"

            [data]
            dir = "/srv/pulse"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.data.dir, PathBuf::from("/srv/pulse"));
        assert_eq!(config.data.reviews_file, "spotify_reviews_multilabel.csv");
    }

    #[test]
    fn test_set_assignments() {
        let mut config = PulseConfig::default();
        config.set("llm.model=gpt-4.1-mini").unwrap();
        config.set("llm.timeout_secs = 15").unwrap();
        config.set("llm.endpoint=http://localhost:8080/").unwrap();
        config.set("dev.show_steps=true").unwrap();
        config.set("output.color=none").unwrap();

        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.timeout_secs, 15);
        assert_eq!(config.llm.endpoint, "http://localhost:8080");
        assert!(config.dev.show_steps);
        assert_eq!(config.output.color, ColorMode::None);

        assert!(config.set("llm.timeout_secs=soon").is_err());
        assert!(config.set("nonsense").is_err());
        assert!(config.set("ui.theme=dark").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut original = PulseConfig::default();
        original.set_color_mode("basic").unwrap();
        original.llm.model = "local-model".to_string();
        original.save_to(&path).unwrap();

        let parsed = PulseConfig::load_from(&path).unwrap();
        assert_eq!(parsed.output.color, ColorMode::Basic);
        assert_eq!(parsed.llm.model, "local-model");
    }
}
