//! Output formatting - ASCII-only terminal reports
//!
//! Every `render_*` function returns the finished text so commands decide
//! where it goes and tests can inspect it.

use owo_colors::OwoColorize;
use pulse_common::agent::{AgentOutcome, AgentStatus};
use pulse_common::credentials::{redact, Credential, CredentialSource};
use pulse_common::insights::{
    DeepDive, ExecutiveSummary, QuickStats, ReleaseHealth, RoadmapOverview, ThemePain, ThemeTrend,
};
use pulse_common::pulse_config::ColorMode;
use pulse_common::PulseConfig;
use std::collections::BTreeMap;
use std::io::IsTerminal;

const BAR_WIDTH: usize = 30;
const REVIEW_WRAP_WIDTH: usize = 76;

/// Colors, or not, depending on configuration and terminal
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    colors: bool,
}

impl Palette {
    pub fn new(mode: ColorMode) -> Self {
        let colors = match mode {
            ColorMode::Auto => {
                std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            ColorMode::Basic => true,
            ColorMode::None => false,
        };
        Self { colors }
    }

    pub fn plain() -> Self {
        Self { colors: false }
    }

    pub fn use_colors(&self) -> bool {
        self.colors
    }

    pub fn section(&self, title: &str) -> String {
        let label = format!("[{}]", title);
        if self.colors {
            label.bold().bright_cyan().to_string()
        } else {
            label
        }
    }

    pub fn good(&self, text: &str) -> String {
        if self.colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn warn(&self, text: &str) -> String {
        if self.colors {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bad(&self, text: &str) -> String {
        if self.colors {
            text.bright_red().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn speaker(&self) -> String {
        if self.colors {
            "pulse:".bright_magenta().bold().to_string()
        } else {
            "pulse:".to_string()
        }
    }
}

/// Severity tag for a review's star rating
pub fn rating_tag(rating: u8) -> &'static str {
    match rating {
        0..=2 => "[LOW]",
        3 => "[MED]",
        _ => "[HIGH]",
    }
}

/// 1234567 -> "1,234,567"
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn rating_text(avg: Option<f64>) -> String {
    match avg {
        Some(avg) => format!("{:.2} / 5", avg),
        None => "N/A".to_string(),
    }
}

fn bar(share_pct: f64) -> String {
    let filled = ((share_pct.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn pain_lines(pain: &[ThemePain], p: &Palette) -> Vec<String> {
    let width = pain.iter().map(|t| t.theme.len()).max().unwrap_or(0);
    pain.iter()
        .map(|t| {
            format!(
                "  {:<width$}  {:>8.1}  {:>6.2}%  {}",
                t.theme,
                t.pain,
                t.share_pct,
                p.dim(&bar(t.share_pct)),
                width = width
            )
        })
        .collect()
}

fn distribution_lines(counts: &BTreeMap<u8, usize>) -> Vec<String> {
    if counts.is_empty() {
        return vec!["  (no reviews)".to_string()];
    }
    let max = counts.values().copied().max().unwrap_or(0).max(1);
    counts
        .iter()
        .map(|(stars, count)| {
            let filled = (count * BAR_WIDTH).div_ceil(max);
            format!("  {} star  {:>6}  {}", stars, thousands(*count), "#".repeat(filled))
        })
        .collect()
}

pub fn render_stats(stats: &QuickStats, p: &Palette) -> String {
    [
        p.section("QUICK STATS"),
        format!("  Total reviews      {}", thousands(stats.total_reviews)),
        format!("  App versions       {}", stats.app_versions),
        format!("  Theme categories   {}", stats.theme_categories),
    ]
    .join("\n")
}

pub fn render_summary(summary: &ExecutiveSummary, p: &Palette) -> String {
    let mut lines = vec![
        format!("{}  release {}", p.section("EXECUTIVE SUMMARY"), summary.version),
        format!("  Reviews          {}", thousands(summary.total_reviews)),
        format!("  Avg rating       {}", rating_text(summary.avg_rating)),
        format!("  Total pain       {:.1}", summary.total_pain),
        format!(
            "  Top pain area    {}",
            summary.top_theme.as_deref().unwrap_or("N/A")
        ),
        format!(
            "  Critical (1-2*)  {} ({})",
            thousands(summary.critical_reviews),
            p.bad(&format!("{:.1}%", summary.critical_share_pct))
        ),
        String::new(),
        p.section("PAIN BY THEME"),
    ];
    lines.extend(pain_lines(&summary.pain_by_theme, p));
    lines.push(String::new());
    lines.push(p.section("RATING DISTRIBUTION"));
    lines.extend(distribution_lines(&summary.rating_distribution));
    lines.join("\n")
}

pub fn render_health(health: &ReleaseHealth, p: &Palette) -> String {
    let mut lines = vec![
        format!("{}  {}", p.section("RELEASE HEALTH"), health.version),
        format!("  Reviews      {}", thousands(health.reviews)),
        format!("  Avg rating   {}", rating_text(health.avg_rating)),
        format!("  Pain score   {:.1}", health.pain_score),
        String::new(),
        p.section("PAIN BY THEME"),
    ];
    lines.extend(pain_lines(&health.themes, p));

    if let Some(previous) = &health.previous {
        lines.push(String::new());
        lines.push(format!("{}  {} vs {}", p.section("COMPARISON"), health.version, previous.version));
        let width = health.themes.iter().map(|t| t.theme.len()).max().unwrap_or(0);
        for theme in &health.themes {
            let before = previous
                .pain_by_theme
                .iter()
                .find(|prev| prev.theme == theme.theme)
                .map(|prev| prev.pain);
            let change = match before {
                Some(before) => {
                    let delta = theme.pain - before;
                    let text = format!("{:+9.1}", delta);
                    if delta > 0.0 {
                        p.bad(&text)
                    } else {
                        p.good(&text)
                    }
                }
                None => p.warn(&format!("{:>9}", "new")),
            };
            lines.push(format!(
                "  {:<width$}  {:>8.1}  {}",
                theme.theme,
                theme.pain,
                change,
                width = width
            ));
        }
    }
    lines.join("\n")
}

pub fn render_roadmap(roadmap: &RoadmapOverview, p: &Palette) -> String {
    let mut lines = vec![
        p.section("ROADMAP"),
        format!("  Total themes   {}", roadmap.total_themes),
        format!("  Persistent     {}", roadmap.persistent_count),
        format!("  Regressions    {}", roadmap.regression_count),
        format!(
            "  Avg effort     {}",
            roadmap
                .avg_effort
                .map(|e| format!("{:.1}", e))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        String::new(),
        p.section("BACKLOG"),
    ];

    let width = roadmap
        .ranked
        .iter()
        .map(|i| i.theme.len())
        .max()
        .unwrap_or(0)
        .max("Theme".len());
    lines.push(p.dim(&format!(
        "  {:>3}  {:<width$}  {:>8}  {:>6}  {:>6}  {:>5}  {:>6}  Flags",
        "#",
        "Theme",
        "Priority",
        "Reach",
        "Impact",
        "Conf",
        "Effort",
        width = width
    )));
    for (rank, item) in roadmap.ranked.iter().enumerate() {
        let mut flags = Vec::new();
        if item.is_regression {
            flags.push(p.bad("REGRESSION"));
        }
        if item.is_persistent {
            flags.push(p.warn("PERSISTENT"));
        }
        lines.push(format!(
            "  {:>3}  {:<width$}  {:>8.2}  {:>6.2}  {:>6.2}  {:>5.2}  {:>6}  {}",
            rank + 1,
            item.theme,
            item.priority_score,
            item.reach,
            item.impact,
            item.confidence,
            item.effort,
            flags.join(" "),
            width = width
        ));
    }

    lines.push(String::new());
    lines.push(p.section("EFFORT DISTRIBUTION"));
    for (effort, count) in &roadmap.effort_distribution {
        lines.push(format!("  effort {}  {:>4}  {}", effort, count, "#".repeat(*count)));
    }
    lines.join("\n")
}

pub fn render_trends(trends: &[ThemeTrend], p: &Palette) -> String {
    let mut lines = vec![p.section("TRENDS")];
    if trends.is_empty() {
        lines.push("  No version signal for the requested themes.".to_string());
        return lines.join("\n");
    }

    for trend in trends {
        lines.push(String::new());
        lines.push(format!("  {}", trend.theme));
        lines.push(p.dim(&format!(
            "    {:<12}  {:>7}  {:>7}  {:>5}  {:>7}",
            "Version", "Signal", "Reviews", "Avg", "Delta"
        )));
        for point in &trend.points {
            let avg = point
                .avg_rating
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| "-".to_string());
            let delta = point
                .delta
                .map(|d| format!("{:+.3}", d))
                .unwrap_or_else(|| "-".to_string());
            let flag = if point.is_regression {
                format!("  {}", p.bad("[REGRESSION]"))
            } else {
                String::new()
            };
            lines.push(format!(
                "    {:<12}  {:>7.3}  {:>7}  {:>5}  {:>7}{}",
                point.app_version, point.normalized_signal, point.review_count, avg, delta, flag
            ));
        }
    }
    lines.join("\n")
}

pub fn render_deep_dive(dive: &DeepDive, p: &Palette) -> String {
    let mut lines = vec![
        format!("{}  {} @ {}", p.section("DEEP DIVE"), dive.theme, dive.version),
        format!("  Total reviews  {}", thousands(dive.total_reviews)),
        format!("  Avg rating     {}", rating_text(dive.avg_rating)),
        format!("  Total pain     {:.1}", dive.total_pain),
        format!("  Persistent?    {}", yes_no(dive.persistent)),
        String::new(),
        p.section(&format!("TOP {} HIGH-IMPACT REVIEWS", dive.reviews.len())),
    ];

    if dive.reviews.is_empty() {
        lines.push("  No reviews found for this combination.".to_string());
    }
    let wrap = textwrap::Options::new(REVIEW_WRAP_WIDTH)
        .initial_indent("      ")
        .subsequent_indent("      ");
    for review in &dive.reviews {
        let tag = rating_tag(review.star_score);
        let tag = match review.star_score {
            0..=2 => p.bad(tag),
            3 => p.warn(tag),
            _ => p.good(tag),
        };
        lines.push(format!(
            "  {} Rating: {}/5 - Pain Weight: {:.2}",
            tag, review.star_score, review.final_weight
        ));
        lines.push(textwrap::fill(&review.content, &wrap));
    }

    lines.push(String::new());
    lines.push(p.section("RATING DISTRIBUTION"));
    lines.extend(distribution_lines(&dive.rating_distribution));
    lines.join("\n")
}

pub fn render_answer(outcome: &AgentOutcome, p: &Palette) -> String {
    let body = match outcome.status {
        AgentStatus::Answered => outcome.answer.clone(),
        AgentStatus::Offline => format!("[NOTE] {}", p.warn(&outcome.answer)),
        AgentStatus::TurnLimit => format!("[WARNING] {}", p.warn(&outcome.answer)),
    };
    format!("{}\n{}", p.speaker(), body)
}

fn source_label(source: CredentialSource) -> &'static str {
    match source {
        CredentialSource::Explicit => "--api-key",
        CredentialSource::SecretsFile => "secrets.toml",
        CredentialSource::Environment => "environment",
    }
}

pub fn render_config(config: &PulseConfig, credential: Option<&Credential>, p: &Palette) -> String {
    let color = match config.output.color {
        ColorMode::Auto => "auto",
        ColorMode::Basic => "basic",
        ColorMode::None => "none",
    };
    let credential = match credential {
        Some(c) => format!("{} ({})", redact(&c.key), source_label(c.source)),
        None => p.warn("not configured (assistant offline)"),
    };

    [
        p.section("CONFIG"),
        format!("  data.dir                  {}", config.data.resolved_dir().display()),
        format!("  data.reviews_file         {}", config.data.reviews_file),
        format!("  data.priority_file        {}", config.data.priority_file),
        format!("  data.persistence_file     {}", config.data.persistence_file),
        format!("  data.version_signal_file  {}", config.data.version_signal_file),
        format!("  llm.enabled               {}", config.llm.enabled),
        format!("  llm.endpoint              {}", config.llm.endpoint),
        format!("  llm.model                 {}", config.llm.model),
        format!("  llm.timeout_secs          {}", config.llm.timeout_secs),
        format!("  output.color              {}", color),
        format!("  dev.show_steps            {}", config.dev.show_steps),
        format!("  dev.show_timing           {}", config.dev.show_timing),
        String::new(),
        p.section("CREDENTIAL"),
        format!("  api key                   {}", credential),
    ]
    .join("\n")
}

/// Display an error (ASCII-only)
pub fn display_error(message: &str, p: &Palette) {
    eprintln!("[ERROR] {}", p.bad(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_tags() {
        assert_eq!(rating_tag(1), "[LOW]");
        assert_eq!(rating_tag(2), "[LOW]");
        assert_eq!(rating_tag(3), "[MED]");
        assert_eq!(rating_tag(5), "[HIGH]");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_bar_is_clamped() {
        assert_eq!(bar(0.0), "");
        assert_eq!(bar(100.0).len(), BAR_WIDTH);
        assert_eq!(bar(250.0).len(), BAR_WIDTH);
        assert_eq!(bar(50.0).len(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let p = Palette::plain();
        assert_eq!(p.section("X"), "[X]");
        assert!(!p.bad("oops").contains('\u{1b}'));
    }
}
