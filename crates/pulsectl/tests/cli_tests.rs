//! CLI surface tests for pulsectl
//!
//! Parsing only; no binary spawning:
//! - pulsectl stats|summary|health|roadmap|trends|deep-dive
//! - pulsectl ask QUESTION / chat
//! - pulsectl tool NAME (hidden)
//! - pulsectl config [--set key=value]

use clap::Parser;
use pulsectl::cli::{Cli, Commands, DEFAULT_DEEP_DIVE_LIMIT};
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("pulsectl").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_global_flags_anywhere() {
    let cli = parse(&["--data-dir", "/srv/pulse", "stats", "--json"]);
    assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/pulse")));
    assert!(cli.json);
    assert_eq!(cli.command, Commands::Stats);
    assert!(cli.config.is_none());
}

#[test]
fn test_health_version() {
    let cli = parse(&["health", "--version", "8.9.0"]);
    assert_eq!(
        cli.command,
        Commands::Health {
            version: Some("8.9.0".to_string())
        }
    );
    assert_eq!(parse(&["health"]).command, Commands::Health { version: None });
}

#[test]
fn test_trends_repeatable_theme() {
    let cli = parse(&["trends", "--theme", "Ads Frequency", "--theme", "playback"]);
    assert_eq!(
        cli.command,
        Commands::Trends {
            themes: vec!["Ads Frequency".to_string(), "playback".to_string()]
        }
    );
}

#[test]
fn test_deep_dive_defaults() {
    let cli = parse(&["deep-dive", "--theme", "Playback Reliability"]);
    assert_eq!(
        cli.command,
        Commands::DeepDive {
            theme: "Playback Reliability".to_string(),
            version: None,
            limit: DEFAULT_DEEP_DIVE_LIMIT,
        }
    );
    assert_eq!(cli.command.name(), "deep-dive");
}

#[test]
fn test_deep_dive_requires_theme() {
    assert!(Cli::try_parse_from(["pulsectl", "deep-dive"]).is_err());
}

#[test]
fn test_ask_joins_words_and_key() {
    let cli = parse(&["ask", "what", "regressed?", "--api-key", "sk-test"]);
    match cli.command {
        Commands::Ask { question, api_key } => {
            assert_eq!(question.join(" "), "what regressed?");
            assert_eq!(api_key.as_deref(), Some("sk-test"));
        }
        other => panic!("unexpected command {:?}", other),
    }
    assert!(Cli::try_parse_from(["pulsectl", "ask"]).is_err());
}

#[test]
fn test_hidden_tool_command() {
    let cli = parse(&["tool", "get_priority_backlog", "--args", r#"{"top_n": 3}"#]);
    assert_eq!(
        cli.command,
        Commands::Tool {
            name: "get_priority_backlog".to_string(),
            args: r#"{"top_n": 3}"#.to_string()
        }
    );
    let cli = parse(&["tool", "get_regression_themes"]);
    assert_eq!(
        cli.command,
        Commands::Tool {
            name: "get_regression_themes".to_string(),
            args: "{}".to_string()
        }
    );
}

#[test]
fn test_config_set_and_roadmap_export() {
    let cli = parse(&["config", "--set", "llm.model=gpt-4o"]);
    assert_eq!(
        cli.command,
        Commands::Config {
            set: Some("llm.model=gpt-4o".to_string())
        }
    );
    assert_eq!(
        parse(&["roadmap", "--export", "out.csv"]).command,
        Commands::Roadmap {
            export: Some(PathBuf::from("out.csv"))
        }
    );
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["pulsectl", "dashboard"]).is_err());
}
