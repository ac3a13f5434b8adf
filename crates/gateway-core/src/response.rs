//! Normalized response types returned by every provider adapter.

use crate::request::{FunctionCall, MessageRole, ToolCall};
use serde::{Deserialize, Serialize};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of turn or stop sequence hit).
    Stop,
    /// Generation was truncated at the token ceiling.
    Length,
    /// The model emitted one or more tool calls.
    ToolCalls,
    /// The response was withheld by upstream content filtering.
    ContentFilter,
}

/// The assistant turn returned for a single choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Always [`MessageRole::Assistant`] for a completed turn.
    pub role: MessageRole,
    /// Text content, absent when the turn is tool-calls only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the model, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Legacy single function call, kept for OpenAI function-calling
    /// callers that predate the `tool_calls` array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// A single generated completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index among this response's choices.
    pub index: u32,
    /// The generated message.
    pub message: ResponseMessage,
    /// Why generation stopped, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Token log-probabilities, when the provider and request support them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

/// Token accounting returned alongside a completion, used verbatim as the
/// input to the cost model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the generated completion.
    pub completion_tokens: u32,
    /// `prompt_tokens + completion_tokens`, as reported by upstream.
    pub total_tokens: u32,
}

/// Normalized, provider-agnostic completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Response id assigned by the adapter (not necessarily upstream's).
    pub id: String,
    /// Model that served the request.
    pub model: String,
    /// One entry per requested completion (`n`).
    pub choices: Vec<Choice>,
    /// Token accounting for the whole response.
    pub usage: Usage,
}

impl GatewayResponse {
    /// Start building a [`GatewayResponse`].
    #[must_use]
    pub fn builder() -> GatewayResponseBuilder {
        GatewayResponseBuilder::default()
    }
}

/// Fluent builder for [`GatewayResponse`].
#[derive(Default)]
pub struct GatewayResponseBuilder {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Usage,
}

impl GatewayResponseBuilder {
    /// Set the response id.
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
    pub fn choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Set the token usage.
    #[must_use]
    pub const fn usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Finish building, defaulting an absent id/model to empty strings
    /// (adapters always set both; tests may not need to).
    #[must_use]
    pub fn build(self) -> GatewayResponse {
        GatewayResponse {
            id: self.id.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            choices: self.choices,
            usage: self.usage,
        }
    }
}

/// A single entry in `GET /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    /// Model id as the caller would pass it.
    pub id: String,
    /// Always `"model"`, matching the OpenAI-compatible shape.
    #[serde(rename = "object")]
    pub object_type: String,
    /// Owning provider or organization.
    pub owned_by: String,
}

/// Body of `GET /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always `"list"`.
    #[serde(rename = "object")]
    pub object_type: String,
    /// Available models.
    pub data: Vec<ModelObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_usage_to_zero() {
        let response = GatewayResponse::builder().id("r1").model("gpt-4o").build();
        assert_eq!(response.usage.total_tokens, 0);
        assert!(response.choices.is_empty());
    }
}
