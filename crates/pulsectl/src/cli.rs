//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default number of reviews shown by `deep-dive`
pub const DEFAULT_DEEP_DIVE_LIMIT: usize = 10;

/// ReleasePulse CLI
#[derive(Parser, Debug)]
#[command(name = "pulsectl")]
#[command(about = "ReleasePulse - release feedback intelligence and PM assistant", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Directory holding the CSV tables (overrides $PULSE_DATA_DIR and config)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (overrides user and system config)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Show total reviews, app versions and theme categories
    Stats,

    /// Executive summary of the latest release
    Summary,

    /// Release health for one version, compared with the previous one
    Health {
        /// App version (default: latest)
        #[arg(long)]
        version: Option<String>,
    },

    /// RICE-ranked backlog with effort distribution
    Roadmap {
        /// Write the ranked backlog to a CSV file
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Pain signal across releases for selected themes
    Trends {
        /// Theme to include (repeatable; default: first three themes)
        #[arg(long = "theme", value_name = "THEME")]
        themes: Vec<String>,
    },

    /// Top reviews and stats for one theme in one release
    DeepDive {
        /// Theme label (case-insensitive substring accepted)
        #[arg(long)]
        theme: String,

        /// App version (default: latest)
        #[arg(long)]
        version: Option<String>,

        /// Number of reviews to show
        #[arg(long, default_value_t = DEFAULT_DEEP_DIVE_LIMIT)]
        limit: usize,
    },

    /// Ask the assistant one question
    Ask {
        /// Question in natural language
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// OpenAI API key (overrides secrets.toml and $OPENAI_API_KEY)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Interactive assistant session
    Chat {
        /// OpenAI API key (overrides secrets.toml and $OPENAI_API_KEY)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },

    /// Run a catalog tool directly and print its JSON (developer-only, hidden)
    #[command(hide = true)]
    Tool {
        /// Tool name, e.g. get_priority_backlog
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Show effective configuration, or change one setting
    Config {
        /// Set a configuration value (key=value)
        #[arg(long, value_name = "KEY=VALUE")]
        set: Option<String>,
    },
}

impl Commands {
    /// Name recorded in the invocation log
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Stats => "stats",
            Commands::Summary => "summary",
            Commands::Health { .. } => "health",
            Commands::Roadmap { .. } => "roadmap",
            Commands::Trends { .. } => "trends",
            Commands::DeepDive { .. } => "deep-dive",
            Commands::Ask { .. } => "ask",
            Commands::Chat { .. } => "chat",
            Commands::Tool { .. } => "tool",
            Commands::Config { .. } => "config",
        }
    }
}
