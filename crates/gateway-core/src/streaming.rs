//! Server-sent-event chunk types for streaming completions.

use crate::request::{FunctionCall, MessageRole, ToolCall};
use crate::response::FinishReason;
use serde::{Deserialize, Serialize};

/// Incremental delta for a single choice in a streamed completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Present only on the first chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    /// Incremental text content, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Incremental tool calls, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Incremental legacy function call, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// One choice's delta within a streamed chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Index among this response's choices.
    pub index: u32,
    /// The incremental delta for this choice.
    pub delta: ChunkDelta,
    /// Set on the final chunk for this choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Token log-probabilities, when requested and supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

/// A single server-sent-event payload in a streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Response id, stable across every chunk of the same completion.
    pub id: String,
    /// Always `"chat.completion.chunk"`, matching the OpenAI-compatible shape.
    pub object: String,
    /// Unix timestamp, seconds, when the chunk was produced.
    pub created: i64,
    /// Model that served the request.
    pub model: String,
    /// One entry per in-flight choice.
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// Start building a [`ChatChunk`].
    #[must_use]
    pub fn builder() -> ChatChunkBuilder {
        ChatChunkBuilder::default()
    }
}

/// Fluent builder for [`ChatChunk`].
#[derive(Default)]
pub struct ChatChunkBuilder {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChunkChoice>,
}

impl ChatChunkBuilder {
    /// Set the chunk/response id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the served model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Append a choice.
    #[must_use]
    pub fn choice(mut self, choice: ChunkChoice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ChatChunk {
        ChatChunk {
            id: self.id.unwrap_or_default(),
            object: "chat.completion.chunk".to_string(),
            created: 0,
            model: self.model.unwrap_or_default(),
            choices: self.choices,
        }
    }
}
