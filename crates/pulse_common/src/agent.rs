//! Assistant loop
//!
//! A bounded decide/act cycle around one model call per turn:
//! 1. AWAIT MODEL - send the conversation and the tool catalog
//! 2. EXECUTE TOOLS - run every requested lookup, in order
//! 3. repeat until a plain answer or the turn budget is spent
//!
//! Transitions are pure functions over [`LoopState`]; only [`run_agent`]
//! talks to the model and the data store.

use crate::credentials::{resolve_credential, Credential};
use crate::data_store::DataStore;
use crate::error::PulseError;
use crate::llm_client::{
    ChatMessage, FinishReason, HttpLlmClient, LlmClient, LlmConfig, ModelReply, ToolCall,
};
use crate::prompts::{OFFLINE_MESSAGE, SYSTEM_PROMPT, TURN_LIMIT_MESSAGE};
use crate::pulse_config::PulseConfig;
use crate::tool_executor::execute_tool;
use crate::tools::{ToolCatalog, ToolResult};
use serde::Serialize;
use tracing::{debug, info};

/// Maximum model calls per user message
pub const MAX_TURNS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingModel {
        turn: usize,
    },
    ExecutingTools {
        turn: usize,
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
    Done(String),
    LimitExceeded,
}

/// Next state after the model answers on `turn`
pub fn on_model_reply(turn: usize, reply: ModelReply) -> LoopState {
    match reply.finish_reason {
        FinishReason::ToolCalls if !reply.tool_calls.is_empty() => LoopState::ExecutingTools {
            turn,
            content: reply.content,
            calls: reply.tool_calls,
        },
        // Stop, truncation, filtering, or a tool_calls finish without calls:
        // whatever content arrived is the answer.
        _ => LoopState::Done(reply.content.unwrap_or_default()),
    }
}

/// Next state once the tools requested on `turn` have run
pub fn after_tools(turn: usize, max_turns: usize) -> LoopState {
    if turn >= max_turns {
        LoopState::LimitExceeded
    } else {
        LoopState::AwaitingModel { turn: turn + 1 }
    }
}

/// Progress hooks for callers that show what the assistant is doing
pub trait AgentObserver {
    fn model_call(&mut self, _turn: usize) {}
    fn tool_executed(&mut self, _call: &ToolCall, _result: &ToolResult) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl AgentObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// The model produced a final answer
    Answered,
    /// No credential; fixed explanatory message
    Offline,
    /// Turn budget spent without a final answer
    TurnLimit,
}

/// One tool execution, kept for display and tests
#[derive(Debug, Clone, Serialize)]
pub struct ToolTrace {
    pub turn: usize,
    pub tool_name: String,
    pub arguments: String,
    pub success: bool,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub answer: String,
    pub status: AgentStatus,
    /// Model calls made
    pub turns: usize,
    pub tool_trace: Vec<ToolTrace>,
}

impl AgentOutcome {
    pub fn offline() -> Self {
        Self {
            answer: OFFLINE_MESSAGE.to_string(),
            status: AgentStatus::Offline,
            turns: 0,
            tool_trace: Vec::new(),
        }
    }

    pub fn answer_text(&self) -> &str {
        &self.answer
    }
}

/// Answer `message` using the model behind `client`.
///
/// Without a client the fixed offline message comes back and nothing else
/// happens. Model failures propagate; tool problems are fed back to the
/// model as data.
pub fn run_agent(
    message: &str,
    store: &DataStore,
    client: Option<&dyn LlmClient>,
    observer: &mut dyn AgentObserver,
) -> Result<AgentOutcome, PulseError> {
    let Some(client) = client else {
        debug!("assistant offline, returning fixed message");
        return Ok(AgentOutcome::offline());
    };

    let tools = ToolCatalog::new().function_schemas();
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)];
    let mut tool_trace = Vec::new();
    let mut turns = 0;
    let mut state = LoopState::AwaitingModel { turn: 1 };

    loop {
        state = match state {
            LoopState::AwaitingModel { turn } => {
                turns = turn;
                observer.model_call(turn);
                debug!(turn, messages = messages.len(), "requesting model completion");
                let reply = client.complete(&messages, &tools)?;
                on_model_reply(turn, reply)
            }
            LoopState::ExecutingTools {
                turn,
                content,
                calls,
            } => {
                messages.push(ChatMessage::assistant_tool_calls(content, calls.clone()));
                for call in &calls {
                    let result = execute_tool(&call.name, &call.arguments, store);
                    observer.tool_executed(call, &result);
                    messages.push(ChatMessage::tool(call.id.clone(), result.to_content()));
                    tool_trace.push(ToolTrace {
                        turn,
                        tool_name: call.name.clone(),
                        arguments: call.arguments.clone(),
                        success: result.success,
                        summary: result.human_summary,
                    });
                }
                after_tools(turn, MAX_TURNS)
            }
            LoopState::Done(answer) => {
                info!(turns, tools = tool_trace.len(), "assistant answered");
                return Ok(AgentOutcome {
                    answer,
                    status: AgentStatus::Answered,
                    turns,
                    tool_trace,
                });
            }
            LoopState::LimitExceeded => {
                info!(turns, tools = tool_trace.len(), "assistant hit the turn limit");
                return Ok(AgentOutcome {
                    answer: TURN_LIMIT_MESSAGE.to_string(),
                    status: AgentStatus::TurnLimit,
                    turns,
                    tool_trace,
                });
            }
        };
    }
}

/// Assistant wired to the configured chat-completions endpoint
pub struct Assistant {
    llm: LlmConfig,
    credential: Option<Credential>,
}

impl Assistant {
    pub fn new(llm: LlmConfig, credential: Option<Credential>) -> Self {
        Self { llm, credential }
    }

    /// Resolve the credential from `explicit`, the secrets file, then the environment
    pub fn from_config(config: &PulseConfig, explicit: Option<&str>) -> Self {
        let secrets = PulseConfig::secrets_path();
        let credential = resolve_credential(explicit, secrets.as_deref());
        Self::new(config.llm.clone(), credential)
    }

    /// Whether questions will reach a model
    pub fn is_online(&self) -> bool {
        self.llm.enabled && self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn ask(&self, message: &str, store: &DataStore) -> Result<AgentOutcome, PulseError> {
        self.ask_with_observer(message, store, &mut NoopObserver)
    }

    pub fn ask_with_observer(
        &self,
        message: &str,
        store: &DataStore,
        observer: &mut dyn AgentObserver,
    ) -> Result<AgentOutcome, PulseError> {
        match (&self.credential, self.llm.enabled) {
            (Some(credential), true) => {
                let client = HttpLlmClient::new(self.llm.clone(), credential.key.clone())?;
                run_agent(message, store, Some(&client), observer)
            }
            _ => run_agent(message, store, None, observer),
        }
    }
}
