//! Provider trait and supporting types.
//!
//! Every upstream adapter (OpenAI-compatible, Anthropic, Google, ...)
//! implements [`LLMProvider`] and is otherwise opaque to the dispatcher.

use crate::error::GatewayError;
use crate::request::GatewayRequest;
use crate::response::GatewayResponse;
use crate::streaming::ChatChunk;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which upstream API family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Any OpenAI-compatible chat completions API.
    OpenAi,
    /// Anthropic's Messages API.
    Anthropic,
    /// Google's Gemini API (AI Studio or Vertex AI).
    Google,
}

/// Liveness of an upstream provider as observed by the last health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Responding normally.
    Healthy,
    /// Responding, but with elevated errors or rate limiting.
    Degraded,
    /// Not responding or failing every request.
    Unhealthy,
}

/// Feature flags a provider supports, used by the dispatcher to reject
/// requests early rather than let an upstream 400 surface late.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Supports chat-style completions.
    pub chat: bool,
    /// Supports server-sent-event streaming.
    pub streaming: bool,
    /// Supports tool/function calling.
    pub function_calling: bool,
    /// Accepts image content parts.
    pub vision: bool,
    /// Exposes an embeddings endpoint.
    pub embeddings: bool,
    /// Supports `response_format: json_object`.
    pub json_mode: bool,
    /// Supports a deterministic `seed` parameter.
    pub seed: bool,
    /// Returns token log-probabilities.
    pub logprobs: bool,
    /// Maximum context window, in tokens, when known.
    pub max_context_length: Option<u32>,
    /// Maximum completion length, in tokens, when known.
    pub max_output_tokens: Option<u32>,
    /// Supports issuing multiple tool calls in one turn.
    pub parallel_tool_calls: bool,
}

/// Static metadata about a single model exposed by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Canonical model id as the caller would pass it.
    pub id: String,
    /// Human-readable display name.
    pub name: Option<String>,
    /// Alternate id this model also responds to.
    pub alias: Option<String>,
    /// Maximum input context length, in tokens.
    pub context_length: Option<u32>,
    /// Maximum output length, in tokens.
    pub max_output_tokens: Option<u32>,
    /// List price per 1K input tokens, USD, for display purposes only —
    /// the authoritative cost computation uses `ModelPricing`, not this.
    pub input_price_per_1k: Option<f64>,
    /// List price per 1K output tokens, USD, for display purposes only.
    pub output_price_per_1k: Option<f64>,
}

impl ModelInfo {
    /// Start building a [`ModelInfo`] for the given model id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            alias: None,
            context_length: None,
            max_output_tokens: None,
            input_price_per_1k: None,
            output_price_per_1k: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an alternate id.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the context length.
    #[must_use]
    pub const fn with_context_length(mut self, tokens: u32) -> Self {
        self.context_length = Some(tokens);
        self
    }

    /// Set the max output length.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Set display-only list pricing, per 1K tokens.
    #[must_use]
    pub const fn with_pricing(mut self, input_per_1k: f64, output_per_1k: f64) -> Self {
        self.input_price_per_1k = Some(input_per_1k);
        self.output_price_per_1k = Some(output_per_1k);
        self
    }
}

/// A single normalized token usage pair returned alongside a chat chunk
/// stream, mirroring [`crate::response::Usage`] for the streaming path.
pub type ProviderStream = BoxStream<'static, Result<ChatChunk, GatewayError>>;

/// Upstream LLM provider adapter.
///
/// Implementations translate [`GatewayRequest`]/[`GatewayResponse`] to and
/// from the upstream wire format; they never see tenant, budget, or policy
/// state — that belongs to the admission pipeline.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Stable identifier for this provider instance (not the provider
    /// family — an operator may run two `openai` adapters against
    /// different base URLs, each with its own id).
    fn id(&self) -> &str;

    /// Which upstream API family this adapter speaks.
    fn provider_type(&self) -> ProviderType;

    /// Feature flags this adapter supports.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Models this adapter serves.
    fn models(&self) -> &[ModelInfo];

    /// Base URL this adapter sends requests to.
    fn base_url(&self) -> &str;

    /// Per-call wall-clock timeout.
    fn timeout(&self) -> Duration;

    /// Perform a single (non-streaming) chat completion.
    ///
    /// # Errors
    /// Returns [`GatewayError::Provider`] on upstream failure, or a typed
    /// variant (`ModelNotFound`, `Authentication`, `RateLimit`, ...) when
    /// the upstream status maps to one.
    async fn chat_completion(&self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError>;

    /// Perform a streaming chat completion.
    ///
    /// # Errors
    /// Same as [`LLMProvider::chat_completion`].
    async fn chat_completion_stream(
        &self,
        request: &GatewayRequest,
    ) -> Result<ProviderStream, GatewayError>;

    /// Check upstream liveness without consuming a full completion.
    async fn health_check(&self) -> HealthStatus;
}
