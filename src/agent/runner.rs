//! ChatAgent - tool-calling loop over a chat model
//!
//! 1. Call the model with the conversation and tool definitions
//! 2. Execute any tool calls and append their results
//! 3. Repeat until the model answers with text only

use super::AgentError;
use crate::provider::ProviderClient;
use crate::tool::{summarize_args, truncate, ToolRegistry};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, FunctionCall,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Instant;

/// Default cap on model round trips per request
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Doom loop detection threshold - if 3 consecutive tool calls have the same
/// name and identical arguments, we're likely stuck in a loop
const DOOM_LOOP_THRESHOLD: usize = 3;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON argument string
    pub arguments: String,
}

/// One model reply: text, tool calls, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }

    pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }
}

/// The language model behind the loop
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply, AgentError>;
}

#[async_trait]
impl ChatModel for ProviderClient {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply, AgentError> {
        let response = self
            .chat_with_tools(messages.to_vec(), tools.to_vec(), None)
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls,
        })
    }
}

/// Runs an instruction + prompt to a final answer
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn run(
        &self,
        instructions: &str,
        tools: &ToolRegistry,
        prompt: &str,
    ) -> Result<String, AgentError>;
}

/// Tracks recent tool calls for doom loop detection
#[derive(Debug, Clone, PartialEq)]
struct ToolCallRecord {
    name: String,
    args_hash: u64,
}

impl ToolCallRecord {
    fn new(name: &str, args: &serde_json::Value) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        // Hash the canonical JSON string for consistent comparison
        let args_str = serde_json::to_string(args).unwrap_or_default();
        args_str.hash(&mut hasher);
        Self {
            name: name.to_string(),
            args_hash: hasher.finish(),
        }
    }
}

/// Check if recent tool calls indicate a doom loop
fn is_doom_loop(recent_calls: &VecDeque<ToolCallRecord>) -> bool {
    if recent_calls.len() < DOOM_LOOP_THRESHOLD {
        return false;
    }

    let calls: Vec<_> = recent_calls.iter().rev().take(DOOM_LOOP_THRESHOLD).collect();
    let first = calls[0];
    calls.iter().all(|c| *c == first)
}

/// Tool-calling agent over any [`ChatModel`]
pub struct ChatAgent<M> {
    /// Agent name (for logs)
    pub name: String,
    model: M,
    max_iterations: usize,
}

impl<M: ChatModel> ChatAgent<M> {
    pub fn new(name: impl Into<String>, model: M) -> Self {
        Self {
            name: name.into(),
            model,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M: ChatModel> Orchestrator for ChatAgent<M> {
    async fn run(
        &self,
        instructions: &str,
        tools: &ToolRegistry,
        prompt: &str,
    ) -> Result<String, AgentError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions.to_string())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()?
                .into(),
        ];
        let tool_defs = tools.to_openai_tools();

        let mut recent_tool_calls: VecDeque<ToolCallRecord> =
            VecDeque::with_capacity(DOOM_LOOP_THRESHOLD + 1);

        tracing::info!(agent = %self.name, "Turn started");

        for iteration in 0..self.max_iterations {
            let reply = self.model.complete(&messages, &tool_defs).await?;

            // No tool calls = done
            if reply.tool_calls.is_empty() {
                let text = reply.content.unwrap_or_default();
                tracing::info!(
                    agent = %self.name,
                    iterations = iteration + 1,
                    "Turn complete"
                );
                return Ok(text);
            }

            if let Some(ref thought) = reply.content {
                tracing::debug!(agent = %self.name, text = %truncate(thought, 200), "Model note");
            }

            // Add assistant message with tool calls to context
            let openai_tool_calls: Vec<ChatCompletionMessageToolCall> = reply
                .tool_calls
                .iter()
                .map(|call| ChatCompletionMessageToolCall {
                    id: call.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect();

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(openai_tool_calls);
            if let Some(content) = reply.content.filter(|c| !c.is_empty()) {
                assistant.content(content);
            }
            messages.push(ChatCompletionRequestMessage::Assistant(assistant.build()?));

            for call in reply.tool_calls {
                let args: serde_json::Value =
                    serde_json::from_str(&call.arguments).unwrap_or(serde_json::json!({}));

                recent_tool_calls.push_back(ToolCallRecord::new(&call.name, &args));
                if recent_tool_calls.len() > DOOM_LOOP_THRESHOLD {
                    recent_tool_calls.pop_front();
                }

                let output = if is_doom_loop(&recent_tool_calls) {
                    tracing::warn!(agent = %self.name, tool = %call.name, "Doom loop detected");
                    // Give the model a fresh chance after the warning
                    recent_tool_calls.clear();
                    format!(
                        "Doom loop detected: '{}' called {} times with identical arguments. \
                        You seem to be stuck. Please try a different approach or ask the user.",
                        call.name, DOOM_LOOP_THRESHOLD
                    )
                } else {
                    tracing::info!(
                        agent = %self.name,
                        tool = %call.name,
                        args = %summarize_args(&args),
                        "Tool call"
                    );

                    let start = Instant::now();
                    let result = tools.execute(&call.name, args).await;

                    tracing::info!(
                        agent = %self.name,
                        tool = %call.name,
                        is_error = result.is_error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        output = %truncate(&result.output, 200),
                        "Tool result"
                    );
                    result.output
                };

                messages.push(ChatCompletionRequestMessage::Tool(
                    ChatCompletionRequestToolMessageArgs::default()
                        .content(output)
                        .tool_call_id(call.id)
                        .build()?,
                ));
            }
        }

        tracing::warn!(agent = %self.name, max = self.max_iterations, "Max iterations reached");
        Err(AgentError::MaxIterations(self.max_iterations))
    }
}
