//! Anthropic Messages API adapter.
//!
//! Anthropic's wire format diverges from the OpenAI shape in three ways this
//! adapter has to bridge: there is no `system` role inside `messages` (system
//! content is a top-level field), `stop` is named `stop_sequences`, and
//! `max_tokens` is required rather than optional.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use gateway_core::{
    ChatChunk, ChatMessage, Choice, ChunkChoice, ChunkDelta, FinishReason, GatewayError,
    GatewayRequest, GatewayResponse, HealthStatus, LLMProvider, MessageContent, MessageRole,
    ModelInfo, ProviderCapabilities, ProviderType, ResponseMessage, Usage,
};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Anthropic requires a `max_tokens` value; this is the fallback used when
/// the gateway request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 4096;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic adapter.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// `x-api-key` credential.
    pub api_key: SecretString,
    /// Base URL, defaults to `https://api.anthropic.com/v1`.
    pub base_url: String,
    /// Per-call wall-clock timeout.
    pub timeout: Duration,
    /// Models this endpoint serves.
    pub models: Vec<ModelInfo>,
}

impl AnthropicConfig {
    /// Build a config pointed at the public Anthropic API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: "https://api.anthropic.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            models: Self::default_models(),
        }
    }

    /// Point this config at a different base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Default model list for the public Anthropic API.
    #[must_use]
    pub fn default_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("claude-3-5-sonnet-20241022")
                .with_name("Claude 3.5 Sonnet")
                .with_context_length(200_000)
                .with_max_output_tokens(8_192),
            ModelInfo::new("claude-3-opus-20240229")
                .with_name("Claude 3 Opus")
                .with_context_length(200_000)
                .with_max_output_tokens(4_096),
            ModelInfo::new("claude-3-haiku-20240307")
                .with_name("Claude 3 Haiku")
                .with_context_length(200_000)
                .with_max_output_tokens(4_096),
        ]
    }
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<&'a [String]>,
    stream: bool,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamEvent {
    MessageStart { message: AnthropicStreamMessageStart },
    ContentBlockDelta { delta: AnthropicStreamDelta },
    MessageDelta { delta: AnthropicStreamStop },
    MessageStop,
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicStreamMessageStart {
    id: String,
    model: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct AnthropicStreamStop {
    stop_reason: Option<String>,
}

fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        "stop_sequence" | "end_turn" => FinishReason::Stop,
        _ => FinishReason::Stop,
    }
}

fn flatten_text_content(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                gateway_core::request::ContentPart::Text { text } => Some(text.as_str()),
                gateway_core::request::ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Splits a gateway request into (system prompt, non-system messages),
/// since Anthropic has no `system` role inside `messages`.
fn split_system_prompt(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
    let mut system_parts = Vec::new();
    let mut rest = Vec::new();
    for message in messages {
        if message.role == MessageRole::System {
            system_parts.push(flatten_text_content(&message.content));
        } else {
            rest.push(message);
        }
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, rest)
}

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::Assistant => "assistant",
        MessageRole::User | MessageRole::Tool | MessageRole::System => "user",
    }
}

/// Adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    id: String,
    config: AnthropicConfig,
    client: Client,
    capabilities: ProviderCapabilities,
}

impl AnthropicProvider {
    /// Construct a provider with the default id `"anthropic"`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        Self::with_id("anthropic", config)
    }

    /// Construct a provider with an explicit instance id.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_id(id: impl Into<String>, config: AnthropicConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            id: id.into(),
            config,
            client,
            capabilities: ProviderCapabilities {
                chat: true,
                streaming: true,
                function_calling: true,
                vision: true,
                embeddings: false,
                json_mode: false,
                seed: false,
                logprobs: false,
                max_context_length: Some(200_000),
                max_output_tokens: Some(8_192),
                parallel_tool_calls: false,
            },
        })
    }

    fn to_wire_request<'a>(request: &'a GatewayRequest, system: Option<&'a str>, messages: &[&'a ChatMessage], stream: bool) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &request.model,
            messages: messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: role_str(m.role),
                    content: m.text_content().unwrap_or_default(),
                })
                .collect(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            stop_sequences: request.stop.as_deref(),
            stream,
        }
    }

    fn map_error(status: u16, body: &str) -> GatewayError {
        let message = serde_json::from_str::<AnthropicErrorBody>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        match status {
            400 => GatewayError::validation(message, None, "anthropic_bad_request"),
            401 | 403 => GatewayError::authentication(message),
            404 => GatewayError::model_not_found(message),
            429 => GatewayError::rate_limit(None, None),
            500..=599 => GatewayError::provider("anthropic", message, Some(status), true),
            _ => GatewayError::provider("anthropic", message, Some(status), false),
        }
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Anthropic
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn models(&self) -> &[ModelInfo] {
        &self.config.models
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn chat_completion(&self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let url = format!("{}/messages", self.config.base_url);
        let (system, messages) = split_system_prompt(&request.messages);
        let body = Self::to_wire_request(request, system.as_deref(), &messages, false);

        debug!(provider = "anthropic", model = %request.model, %url, "dispatching chat completion");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::provider("anthropic", format!("request failed: {e}"), None, true))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::provider("anthropic", format!("failed to read response: {e}"), None, true))?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::provider("anthropic", format!("invalid response JSON: {e}"), None, false))?;

        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = Usage {
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
            total_tokens: parsed.usage.input_tokens + parsed.usage.output_tokens,
        };

        let message = ResponseMessage {
            role: MessageRole::Assistant,
            content: Some(content),
            tool_calls: None,
            function_call: None,
        };

        Ok(GatewayResponse::builder()
            .id(parsed.id)
            .model(parsed.model)
            .usage(usage)
            .choice(Choice {
                index: 0,
                message,
                finish_reason: parsed.stop_reason.as_deref().map(map_stop_reason),
                logprobs: None,
            })
            .build())
    }

    async fn chat_completion_stream(
        &self,
        request: &GatewayRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, GatewayError>>, GatewayError> {
        let url = format!("{}/messages", self.config.base_url);
        let (system, messages) = split_system_prompt(&request.messages);
        let body = Self::to_wire_request(request, system.as_deref(), &messages, true);
        let api_key = self.config.api_key.expose_secret().to_string();

        let request_builder = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let mut event_source = EventSource::new(request_builder)
            .map_err(|e| GatewayError::streaming(format!("failed to create event source: {e}")))?;

        let stream = try_stream! {
            let mut response_id = String::new();
            let mut model = String::new();

            while let Some(event) = event_source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(msg)) => {
                        match serde_json::from_str::<AnthropicStreamEvent>(&msg.data) {
                            Ok(AnthropicStreamEvent::MessageStart { message }) => {
                                response_id = message.id;
                                model = message.model;
                            }
                            Ok(AnthropicStreamEvent::ContentBlockDelta { delta: AnthropicStreamDelta::TextDelta { text } }) => {
                                let chunk = ChatChunk::builder()
                                    .id(response_id.clone())
                                    .model(model.clone())
                                    .choice(ChunkChoice {
                                        index: 0,
                                        delta: ChunkDelta {
                                            role: Some(MessageRole::Assistant),
                                            content: Some(text),
                                            tool_calls: None,
                                            function_call: None,
                                        },
                                        finish_reason: None,
                                        logprobs: None,
                                    })
                                    .build();
                                yield chunk;
                            }
                            Ok(AnthropicStreamEvent::MessageDelta { delta }) => {
                                let chunk = ChatChunk::builder()
                                    .id(response_id.clone())
                                    .model(model.clone())
                                    .choice(ChunkChoice {
                                        index: 0,
                                        delta: ChunkDelta::default(),
                                        finish_reason: delta.stop_reason.as_deref().map(map_stop_reason),
                                        logprobs: None,
                                    })
                                    .build();
                                yield chunk;
                            }
                            Ok(AnthropicStreamEvent::MessageStop) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "failed to parse Anthropic stream event");
                            }
                        }
                    }
                    Err(e) => {
                        Err(GatewayError::streaming(format!("stream error: {e}")))?;
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> HealthStatus {
        let url = format!("{}/messages", self.config.base_url);
        let probe = AnthropicRequest {
            model: "claude-3-haiku-20240307",
            messages: vec![AnthropicMessage { role: "user", content: "ping" }],
            max_tokens: 1,
            system: None,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            stream: false,
        };
        match self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&probe)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) if response.status().as_u16() == 429 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_system_prompt_extracts_system_messages() {
        let messages = vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("hello"),
        ];
        let (system, rest) = split_system_prompt(&messages);
        assert_eq!(system.as_deref(), Some("be terse"));
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn split_system_prompt_returns_none_when_absent() {
        let messages = vec![ChatMessage::user("hello")];
        let (system, rest) = split_system_prompt(&messages);
        assert!(system.is_none());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn missing_max_tokens_falls_back_to_default() {
        let request = GatewayRequest::builder()
            .model("claude-3-haiku-20240307")
            .message(ChatMessage::user("hi"))
            .build()
            .expect("valid request");
        let (system, messages) = split_system_prompt(&request.messages);
        let wire = AnthropicProvider::to_wire_request(&request, system.as_deref(), &messages, false);
        assert_eq!(wire.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn map_stop_reason_translates_max_tokens_to_length() {
        assert!(matches!(map_stop_reason("max_tokens"), FinishReason::Length));
        assert!(matches!(map_stop_reason("end_turn"), FinishReason::Stop));
    }
}
