//! Command execution
//!
//! Loads configuration and data once, then hands off to the report or
//! assistant code for the chosen subcommand.

use crate::chat::{ask_with_progress, run_chat};
use crate::cli::{Cli, Commands};
use crate::output::{self, Palette};
use anyhow::{Context, Result};
use pulse_common::agent::Assistant;
use pulse_common::credentials::redact;
use pulse_common::insights;
use pulse_common::tool_executor::{execute_tool, resolve_theme};
use pulse_common::{DataStore, PulseConfig, PulseError};
use serde::Serialize;
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Run the parsed command line
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let palette = if cli.json {
        Palette::plain()
    } else {
        Palette::new(config.output.color)
    };

    if let Commands::Config { set } = &cli.command {
        return config_command(config, set.as_deref(), cli, palette);
    }

    let dir = data_dir(cli.data_dir.as_deref(), &config);
    let store = DataStore::load(&dir, &config.data)
        .with_context(|| format!("Cannot load review data from {}", dir.display()))?;

    match &cli.command {
        Commands::Stats => emit(cli.json, &insights::quick_stats(&store), |s| {
            output::render_stats(s, &palette)
        }),
        Commands::Summary => {
            let summary = insights::executive_summary(&store)
                .ok_or_else(|| PulseError::UnknownVersion("latest".to_string()))?;
            emit(cli.json, &summary, |s| output::render_summary(s, &palette))
        }
        Commands::Health { version } => {
            let health = insights::release_health(&store, version.as_deref())?;
            emit(cli.json, &health, |h| output::render_health(h, &palette))
        }
        Commands::Roadmap { export } => roadmap_command(&store, export.as_deref(), cli.json, palette),
        Commands::Trends { themes } => {
            let trends = insights::theme_trends(&store, &trend_themes(&store, themes));
            emit(cli.json, &trends, |t| output::render_trends(t, &palette))
        }
        Commands::DeepDive {
            theme,
            version,
            limit,
        } => {
            let known = store.review_themes();
            let label = resolve_theme(theme.trim(), &known)
                .ok_or_else(|| PulseError::UnknownTheme(theme.clone()))?;
            let dive = insights::deep_dive(&store, label, version.as_deref(), *limit)?;
            emit(cli.json, &dive, |d| output::render_deep_dive(d, &palette))
        }
        Commands::Ask { question, api_key } => {
            let assistant = Assistant::from_config(&config, api_key.as_deref());
            let question = question.join(" ");
            let outcome = ask_with_progress(&assistant, &store, &question, &config, palette, cli.json)?;
            emit(cli.json, &outcome, |o| output::render_answer(o, &palette))
        }
        Commands::Chat { api_key } => {
            let assistant = Assistant::from_config(&config, api_key.as_deref());
            run_chat(&assistant, &store, &config, palette)
        }
        Commands::Tool { name, args } => {
            let result = execute_tool(name, args, &store);
            println!("{}", result.to_content());
            match result.error {
                Some(error) if !result.success => Err(anyhow::anyhow!(error)),
                _ => Ok(()),
            }
        }
        Commands::Config { .. } => Ok(()),
    }
}

/// `--config` file, else user, system, defaults. Failures are config errors.
pub fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    let loaded = match path {
        Some(path) => PulseConfig::load_from(path),
        None => PulseConfig::load(),
    };
    loaded.map_err(|e| PulseError::Config(format!("{:#}", e)).into())
}

/// `--data-dir`, else $PULSE_DATA_DIR, else the configured directory
pub fn data_dir(flag: Option<&Path>, config: &PulseConfig) -> PathBuf {
    match flag {
        Some(dir) => dir.to_path_buf(),
        None => config.data.resolved_dir(),
    }
}

/// Requested trend themes resolved to known labels, or the default selection
pub fn trend_themes(store: &DataStore, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return insights::default_trend_themes(store);
    }

    let mut known: Vec<&str> = Vec::new();
    for signal in store.version_signal() {
        if !known.contains(&signal.theme.as_str()) {
            known.push(&signal.theme);
        }
    }
    requested
        .iter()
        .map(|theme| match resolve_theme(theme.trim(), &known) {
            Some(label) => label.to_string(),
            None => {
                warn!(theme = %theme, "no version signal for theme");
                theme.clone()
            }
        })
        .collect()
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", render(value));
    }
    Ok(())
}

fn roadmap_command(store: &DataStore, export: Option<&Path>, json: bool, palette: Palette) -> Result<()> {
    let roadmap = insights::roadmap_overview(store);

    if let Some(path) = export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        insights::write_backlog_csv(&roadmap.ranked, file)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), rows = roadmap.ranked.len(), "exported backlog");
        if !json {
            println!(
                "[OK] {}",
                palette.good(&format!(
                    "Exported {} themes to {}",
                    roadmap.ranked.len(),
                    path.display()
                ))
            );
        }
    }

    emit(json, &roadmap, |r| output::render_roadmap(r, &palette))
}

fn config_command(mut config: PulseConfig, set: Option<&str>, cli: &Cli, palette: Palette) -> Result<()> {
    if let Some(assignment) = set {
        config.set(assignment)?;
        let path = match &cli.config {
            Some(path) => {
                config.save_to(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        println!(
            "[OK] {}",
            palette.good(&format!("Saved {} to {}", assignment.trim(), path.display()))
        );
        return Ok(());
    }

    let assistant = Assistant::from_config(&config, None);
    if cli.json {
        let credential = assistant.credential().map(|c| {
            json!({
                "key": redact(&c.key),
                "source": format!("{:?}", c.source),
            })
        });
        let value = json!({ "config": config, "credential": credential });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", output::render_config(&config, assistant.credential(), &palette));
    }
    Ok(())
}
