//! Pulsectl library - exposes modules for testing

pub mod chat;
pub mod cli;
pub mod commands;
pub mod errors;
pub mod logging;
pub mod output;
pub mod spinner;
