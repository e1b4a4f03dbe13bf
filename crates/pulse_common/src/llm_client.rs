//! LLM Client Abstraction
//!
//! Chat-completions interface with native tool calling. The assistant loop
//! only depends on the [`LlmClient`] trait; [`HttpLlmClient`] speaks the
//! OpenAI-compatible wire format and [`FakeLlmClient`] replays scripted
//! replies for tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Per-request timeout; there is no automatic retry
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON text exactly as the model produced it
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One entry of the conversation sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content.into())
    }

    /// The assistant turn that requested `calls`
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// OpenAI chat-completions message object
    pub fn to_wire(&self) -> Value {
        let mut message = json!({
            "role": self.role,
            "content": self.content,
        });
        if !self.tool_calls.is_empty() {
            message["tool_calls"] = self
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": { "name": call.name, "arguments": call.arguments },
                    })
                })
                .collect();
        }
        if let Some(id) = &self.tool_call_id {
            message["tool_call_id"] = json!(id);
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The parts of a completion the assistant loop consumes
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub finish_reason: FinishReason,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    /// A plain final answer
    pub fn stop(content: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReason::Stop,
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A turn that asks for tools
    pub fn with_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            finish_reason: FinishReason::ToolCalls,
            content: None,
            tool_calls: calls,
        }
    }
}

#[derive(Deserialize)]
struct WireCompletion {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    finish_reason: Option<String>,
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

/// Extract the first choice of a chat-completions response body
pub fn parse_chat_completion(body: Value) -> Result<ModelReply, LlmError> {
    let completion: WireCompletion = serde_json::from_value(body)
        .map_err(|e| LlmError::InvalidJson(format!("Unexpected completion shape: {}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments.unwrap_or_default(),
        })
        .collect();

    Ok(ModelReply {
        finish_reason: FinishReason::parse(choice.finish_reason.as_deref().unwrap_or("stop")),
        content: choice.message.content,
        tool_calls,
    })
}

/// Generic LLM client trait
pub trait LlmClient: Send + Sync {
    /// Request one completion over `messages`, offering `tools` with automatic tool choice
    fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelReply, LlmError>;
}

/// Real LLM client implementation using HTTP
pub struct HttpLlmClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        if !config.enabled {
            return Err(LlmError::Disabled);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ModelReply, LlmError> {
        let request_body = json!({
            "model": self.config.model,
            "messages": messages.iter().map(ChatMessage::to_wire).collect::<Vec<_>>(),
            "tools": tools,
            "tool_choice": "auto",
        });

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::HttpError(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_json: Value = response
            .json()
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        parse_chat_completion(response_json)
    }
}

/// Fake LLM client for testing
///
/// Replies are handed out in order; the last one repeats forever.
pub struct FakeLlmClient {
    responses: Mutex<Vec<Result<ModelReply, LlmError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses
    pub fn new(responses: Vec<Result<ModelReply, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake client that always returns the same reply
    pub fn always(reply: ModelReply) -> Self {
        Self::new(vec![Ok(reply)])
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Conversations received, one per call
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LlmClient for FakeLlmClient {
    fn complete(&self, messages: &[ChatMessage], _tools: &[Value]) -> Result<ModelReply, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, "https://api.openai.com");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_disabled_config_refuses_client() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        assert!(matches!(
            HttpLlmClient::new(config, "sk-test"),
            Err(LlmError::Disabled)
        ));
    }

    #[test]
    fn test_parse_tool_call_completion() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_priority_backlog", "arguments": "{\"top_n\": 3}"}
                    }]
                }
            }]
        });

        let reply = parse_chat_completion(body).unwrap();
        assert_eq!(reply.finish_reason, FinishReason::ToolCalls);
        assert!(reply.content.is_none());
        assert_eq!(
            reply.tool_calls,
            vec![ToolCall::new("call_abc", "get_priority_backlog", "{\"top_n\": 3}")]
        );
    }

    #[test]
    fn test_parse_stop_completion() {
        let body = json!({
            "choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Fix playback first."}
            }]
        });
        let reply = parse_chat_completion(body).unwrap();
        assert_eq!(reply, ModelReply::stop("Fix playback first."));
    }

    #[test]
    fn test_parse_empty_choices() {
        let result = parse_chat_completion(json!({"choices": []}));
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_unknown_finish_reason_is_kept() {
        assert_eq!(
            FinishReason::parse("insufficient_system_resource"),
            FinishReason::Other("insufficient_system_resource".to_string())
        );
    }

    #[test]
    fn test_tool_message_wire_format() {
        let wire = ChatMessage::tool("call_1", "[]").to_wire();
        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "call_1");
        assert_eq!(wire["content"], "[]");

        let assistant = ChatMessage::assistant_tool_calls(
            None,
            vec![ToolCall::new("call_1", "get_regression_themes", "{}")],
        )
        .to_wire();
        assert_eq!(assistant["role"], "assistant");
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(assistant["tool_calls"][0]["function"]["name"], "get_regression_themes");
    }

    #[test]
    fn test_fake_client_replays_in_order_then_repeats() {
        let client = FakeLlmClient::new(vec![
            Ok(ModelReply::stop("one")),
            Ok(ModelReply::stop("two")),
        ]);
        let messages = vec![ChatMessage::user("hi")];

        assert_eq!(client.complete(&messages, &[]).unwrap().content.as_deref(), Some("one"));
        assert_eq!(client.complete(&messages, &[]).unwrap().content.as_deref(), Some("two"));
        assert_eq!(client.complete(&messages, &[]).unwrap().content.as_deref(), Some("two"));
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.requests()[0], messages);
    }

    #[test]
    fn test_fake_client_always_error() {
        let client = FakeLlmClient::always_error(LlmError::Timeout(30));
        assert!(client.complete(&[], &[]).is_err());
        assert_eq!(client.call_count(), 1);
    }
}
