//! Response types for the Gateway SDK.

use serde::{Deserialize, Serialize};

/// Response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Object type (always "chat.completion"). The gateway's own
    /// responses omit this field entirely, so it defaults rather than
    /// failing deserialization against a real gateway response body.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp of when the completion was created. Omitted by the
    /// gateway's own responses; defaults to 0 rather than rejecting them.
    #[serde(default)]
    pub created: i64,
    /// Model used for the completion.
    pub model: String,
    /// List of completion choices.
    pub choices: Vec<ChatChoice>,
    /// Token usage statistics.
    #[serde(default)]
    pub usage: Option<Usage>,
    /// System fingerprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatResponse {
    /// Get the content of the first choice.
    ///
    /// This is a convenience method for the common case of single-choice responses.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }

    /// Get the first choice.
    pub fn first_choice(&self) -> Option<&ChatChoice> {
        self.choices.first()
    }

    /// Get all choices.
    pub fn all_choices(&self) -> &[ChatChoice] {
        &self.choices
    }

    /// Get the finish reason of the first choice.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }

    /// Check if the response was completed normally.
    pub fn is_complete(&self) -> bool {
        self.finish_reason() == Some("stop")
    }

    /// Check if the response was truncated due to length.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason() == Some("length")
    }

    /// Get the total number of tokens used.
    pub fn total_tokens(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.total_tokens)
    }

    /// Get the number of prompt tokens.
    pub fn prompt_tokens(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.prompt_tokens)
    }

    /// Get the number of completion tokens.
    pub fn completion_tokens(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.completion_tokens)
    }
}

/// A single completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Index of this choice.
    pub index: u32,
    /// The generated message.
    pub message: ChatMessage,
    /// Reason for completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Log probabilities (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<serde_json::Value>,
}

impl ChatChoice {
    /// Get the content of the message.
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Get the role of the message.
    pub fn role(&self) -> &str {
        &self.message.role
    }

    /// Check if this choice completed normally.
    pub fn is_complete(&self) -> bool {
        self.finish_reason.as_deref() == Some("stop")
    }
}

/// A message in a chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: String,
    /// Content of the message.
    #[serde(default)]
    pub content: String,
    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Function call (deprecated, use tool_calls).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for the tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details.
    pub function: FunctionCall,
}

/// A function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function.
    pub name: String,
    /// Arguments as a JSON string.
    pub arguments: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens in the completion.
    pub completion_tokens: u32,
    /// Total number of tokens.
    pub total_tokens: u32,
}

impl Usage {
    /// Create new usage statistics.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Check if any tokens were used.
    pub fn has_usage(&self) -> bool {
        self.total_tokens > 0
    }
}

impl std::ops::Add for Usage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
        }
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Response containing a list of models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsListResponse {
    /// Object type (always "list").
    pub object: String,
    /// List of available models.
    pub data: Vec<ModelInfo>,
}

/// Information about a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Object type (always "model").
    pub object: String,
    /// Unix timestamp of when the model was created. The gateway's own
    /// `/v1/models` response omits this field; defaults to 0.
    #[serde(default)]
    pub created: i64,
    /// Organization that owns the model.
    pub owned_by: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Timestamp of the health check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Version of the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Additional details.
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl HealthResponse {
    /// Check if the status is healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "healthy" | "ok" | "up")
    }
}
