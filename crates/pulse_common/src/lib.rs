//! Pulse Common - data model, tools and assistant loop for ReleasePulse
//!
//! Everything here works over an immutable [`DataStore`] loaded once from the
//! precomputed CSV tables. The CLI (`pulsectl`) is only a presentation layer.

pub mod agent;
pub mod credentials;
pub mod data_store;
pub mod error;
pub mod insights;
pub mod llm_client;
pub mod prompts;
pub mod pulse_config;
pub mod tool_executor;
pub mod tools;
pub mod types;

pub use agent::{run_agent, AgentOutcome, AgentStatus, Assistant};
pub use data_store::DataStore;
pub use error::PulseError;
pub use pulse_config::PulseConfig;
pub use types::*;
