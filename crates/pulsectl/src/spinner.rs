//! Thinking spinner shown while the assistant works

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ASCII_FRAMES: &[&str] = &["-", "\\", "|", "/"];

/// Spinner on stderr; hidden when stderr is not a terminal or `quiet` is set
pub fn create_thinking_spinner(use_colors: bool, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    let (frames, template) = if use_colors {
        (BRAILLE_FRAMES, "{spinner:.magenta} {msg}")
    } else {
        (ASCII_FRAMES, "{spinner} {msg}")
    };
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(frames)
        .template(template)
    {
        spinner.set_style(style);
    }
    spinner.set_message("pulse (thinking)...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
