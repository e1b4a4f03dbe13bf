//! Assistant front end: single questions and the interactive session
//!
//! Commands inside a session:
//! - `/quit` (or `/exit`) ends it
//! - `/history` shows the last exchanges

use crate::output::{display_error, render_answer, Palette};
use crate::spinner::create_thinking_spinner;
use anyhow::Result;
use indicatif::ProgressBar;
use pulse_common::agent::{AgentObserver, AgentOutcome, Assistant};
use pulse_common::llm_client::ToolCall;
use pulse_common::tools::{ToolCatalog, ToolName, ToolResult};
use pulse_common::{DataStore, PulseConfig, PulseError};
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// Messages shown by `/history`
pub const HISTORY_SHOWN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Everything said in one session, oldest first
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    entries: Vec<ChatEntry>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(ChatEntry {
            speaker,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last [`HISTORY_SHOWN`] entries
    pub fn recent(&self) -> &[ChatEntry] {
        let start = self.entries.len().saturating_sub(HISTORY_SHOWN);
        &self.entries[start..]
    }

    pub fn render(&self, p: &Palette) -> String {
        if self.entries.is_empty() {
            return p.dim("(no messages yet)");
        }
        self.recent()
            .iter()
            .map(|entry| match entry.speaker {
                Speaker::User => format!("you: {}", entry.text),
                Speaker::Assistant => format!("{} {}", p.speaker(), entry.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    History,
    Empty,
    Question(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => ChatInput::Empty,
        "/quit" | "/exit" | "/q" => ChatInput::Quit,
        "/history" => ChatInput::History,
        _ => ChatInput::Question(trimmed.to_string()),
    }
}

/// Keeps the spinner moving and optionally prints each step
struct StepPrinter<'a> {
    spinner: &'a ProgressBar,
    palette: Palette,
    catalog: ToolCatalog,
    show_steps: bool,
}

impl AgentObserver for StepPrinter<'_> {
    fn model_call(&mut self, turn: usize) {
        if turn > 1 {
            self.spinner
                .set_message(format!("pulse (thinking, turn {})...", turn));
        }
    }

    fn tool_executed(&mut self, call: &ToolCall, result: &ToolResult) {
        if !self.show_steps {
            return;
        }
        let request = ToolName::parse(&call.name)
            .and_then(|tool| self.catalog.get(tool))
            .map(|def| def.human_request)
            .unwrap_or("call a tool outside the catalog");
        let line = format!("  [step] {} -> {}", request, result.human_summary);
        let line = if result.success {
            self.palette.dim(&line)
        } else {
            self.palette.warn(&line)
        };
        self.spinner.suspend(|| eprintln!("{}", line));
    }
}

/// Ask one question with a spinner and optional step output
pub fn ask_with_progress(
    assistant: &Assistant,
    store: &DataStore,
    question: &str,
    config: &PulseConfig,
    palette: Palette,
    quiet: bool,
) -> Result<AgentOutcome, PulseError> {
    let spinner = if assistant.is_online() {
        create_thinking_spinner(palette.use_colors(), quiet)
    } else {
        ProgressBar::hidden()
    };
    let mut printer = StepPrinter {
        spinner: &spinner,
        palette,
        catalog: ToolCatalog::new(),
        show_steps: config.dev.should_show_steps() && !quiet,
    };

    let started = Instant::now();
    let outcome = assistant.ask_with_observer(question, store, &mut printer);
    spinner.finish_and_clear();

    if config.dev.show_timing && !quiet {
        eprintln!(
            "{}",
            palette.dim(&format!("[timing] {:.2}s", started.elapsed().as_secs_f64()))
        );
    }
    outcome
}

/// Interactive session on stdin/stdout
pub fn run_chat(
    assistant: &Assistant,
    store: &DataStore,
    config: &PulseConfig,
    palette: Palette,
) -> Result<()> {
    println!("{}", palette.section("RELEASEPULSE ASSISTANT"));
    println!(
        "{}",
        palette.dim("Ask about priorities, regressions or what users said. /history, /quit.")
    );
    if !assistant.is_online() {
        println!("{}", palette.warn("Offline: no API key configured."));
    }

    let mut history = ChatHistory::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        match parse_input(&line?) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::History => println!("{}", history.render(&palette)),
            ChatInput::Question(question) => {
                history.push(Speaker::User, question.as_str());
                match ask_with_progress(assistant, store, &question, config, palette, false) {
                    Ok(outcome) => {
                        println!("{}\n", render_answer(&outcome, &palette));
                        history.push(Speaker::Assistant, outcome.answer);
                    }
                    Err(err) => display_error(&err.to_string(), &palette),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  /quit "), ChatInput::Quit);
        assert_eq!(parse_input("/EXIT"), ChatInput::Quit);
        assert_eq!(parse_input("/history"), ChatInput::History);
        assert_eq!(parse_input("   "), ChatInput::Empty);
        assert_eq!(
            parse_input(" What regressed? "),
            ChatInput::Question("What regressed?".to_string())
        );
    }

    #[test]
    fn test_offline_question_needs_no_spinner() {
        let assistant = Assistant::new(Default::default(), None);
        let outcome = ask_with_progress(
            &assistant,
            &DataStore::default(),
            "What should we fix?",
            &PulseConfig::default(),
            Palette::plain(),
            true,
        )
        .unwrap();
        assert_eq!(outcome.turns, 0);
    }
}
