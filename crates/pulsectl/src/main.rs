//! Pulse Control - CLI for ReleasePulse
//!
//! Release reports over the precomputed review tables, plus the
//! tool-calling PM assistant.

use clap::Parser;
use pulse_common::pulse_config::ColorMode;
use pulsectl::cli::Cli;
use pulsectl::commands;
use pulsectl::errors::{error_label, exit_code_for, EXIT_SUCCESS};
use pulsectl::logging::{init_tracing, redact_args, LogEntry};
use pulsectl::output::{display_error, Palette};
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let started = Instant::now();
    let result = commands::run(&cli);
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let exit_code = match &result {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => exit_code_for(err),
    };

    let mut entry = LogEntry::new(
        cli.command.name(),
        redact_args(std::env::args().skip(1)),
        exit_code,
        duration_ms,
    );
    if let Err(err) = &result {
        let message = format!("{:#}", err);
        display_error(&message, &Palette::new(ColorMode::Auto));
        entry = entry.with_error(error_label(err), message);
    }
    if let Err(e) = entry.write() {
        tracing::debug!(error = %e, "cannot write invocation log");
    }

    std::process::exit(exit_code);
}
