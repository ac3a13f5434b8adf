//! OpenAI-compatible adapter.
//!
//! Serves `/v1/chat/completions`-shaped traffic against any OpenAI-compatible
//! endpoint (OpenAI itself, or a self-hosted gateway speaking the same wire
//! format). Per the dispatcher contract this adapter is pass-through: no
//! field renaming, only model routing and usage extraction.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use gateway_core::{
    ChatChunk, ChatMessage, Choice, ChunkChoice, ChunkDelta, FinishReason, GatewayError,
    GatewayRequest, GatewayResponse, HealthStatus, LLMProvider, ModelInfo, ProviderCapabilities,
    ProviderType, ResponseMessage, Usage,
};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for a single OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Provider instance id.
    pub id: String,
    /// Bearer credential sent as `Authorization: Bearer <key>`.
    pub api_key: SecretString,
    /// Base URL, defaults to `https://api.openai.com/v1`.
    pub base_url: String,
    /// Per-call wall-clock timeout.
    pub timeout: Duration,
    /// Models this endpoint serves.
    pub models: Vec<ModelInfo>,
}

impl OpenAiConfig {
    /// Build a config pointed at the public OpenAI API.
    #[must_use]
    pub fn new(id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_key: SecretString::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            models: Self::default_models(),
        }
    }

    /// Point this config at a different base URL (self-hosted gateways,
    /// Azure-style deployments speaking the OpenAI wire format, etc.).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Default model list for the public OpenAI API.
    #[must_use]
    pub fn default_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("gpt-4o")
                .with_name("GPT-4o")
                .with_context_length(128_000)
                .with_max_output_tokens(16_384),
            ModelInfo::new("gpt-4o-mini")
                .with_name("GPT-4o mini")
                .with_context_length(128_000)
                .with_max_output_tokens(16_384),
            ModelInfo::new("gpt-3.5-turbo")
                .with_name("GPT-3.5 Turbo")
                .with_context_length(16_385)
                .with_max_output_tokens(4_096),
        ]
    }
}

/// OpenAI-compatible wire request body. Deliberately mirrors
/// [`GatewayRequest`]'s shape so serializing one is pass-through.
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    index: u32,
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiChunk {
    id: String,
    model: String,
    choices: Vec<OpenAiChunkChoice>,
}

#[derive(Deserialize)]
struct OpenAiChunkChoice {
    index: u32,
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Adapter for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
    capabilities: ProviderCapabilities,
}

impl OpenAiProvider {
    /// Construct a provider from its configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            capabilities: ProviderCapabilities {
                chat: true,
                streaming: true,
                function_calling: true,
                vision: true,
                embeddings: false,
                json_mode: true,
                seed: true,
                logprobs: true,
                max_context_length: Some(128_000),
                max_output_tokens: Some(16_384),
                parallel_tool_calls: true,
            },
        })
    }

    fn to_wire_request<'a>(request: &'a GatewayRequest, stream: bool) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stop: request.stop.as_deref(),
            stream,
        }
    }

    fn map_error(status: u16, body: &str) -> GatewayError {
        let message = serde_json::from_str::<OpenAiErrorBody>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        match status {
            400 => GatewayError::validation(message, None, "openai_bad_request"),
            401 | 403 => GatewayError::authentication(message),
            404 => GatewayError::model_not_found(message),
            429 => GatewayError::rate_limit(None, None),
            500..=599 => GatewayError::provider("openai", message, Some(status), true),
            _ => GatewayError::provider("openai", message, Some(status), false),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
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
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = Self::to_wire_request(request, false);

        debug!(provider = "openai", model = %request.model, %url, "dispatching chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::provider("openai", format!("request failed: {e}"), None, true))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::provider("openai", format!("failed to read response: {e}"), None, true))?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::provider("openai", format!("invalid response JSON: {e}"), None, false))?;

        let usage = parsed.usage.map_or_else(Usage::default, |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let mut builder = GatewayResponse::builder().id(parsed.id).model(parsed.model).usage(usage);
        for choice in parsed.choices {
            builder = builder.choice(Choice {
                index: choice.index,
                message: choice.message,
                finish_reason: choice.finish_reason.as_deref().map(map_finish_reason),
                logprobs: None,
            });
        }

        Ok(builder.build())
    }

    async fn chat_completion_stream(
        &self,
        request: &GatewayRequest,
    ) -> Result<BoxStream<'static, Result<ChatChunk, GatewayError>>, GatewayError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = Self::to_wire_request(request, true);
        let api_key = self.config.api_key.expose_secret().to_string();

        let request_builder = self.client.post(&url).bearer_auth(api_key).json(&body);

        let mut event_source = EventSource::new(request_builder)
            .map_err(|e| GatewayError::streaming(format!("failed to create event source: {e}")))?;

        let stream = try_stream! {
            while let Some(event) = event_source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(msg)) => {
                        let data = msg.data.trim();
                        if data == "[DONE]" {
                            break;
                        }
                        match serde_json::from_str::<OpenAiChunk>(data) {
                            Ok(chunk) => {
                                let mut builder = ChatChunk::builder().id(chunk.id).model(chunk.model);
                                for choice in chunk.choices {
                                    builder = builder.choice(ChunkChoice {
                                        index: choice.index,
                                        delta: choice.delta,
                                        finish_reason: choice.finish_reason.as_deref().map(map_finish_reason),
                                        logprobs: None,
                                    });
                                }
                                yield builder.build();
                            }
                            Err(e) => {
                                warn!(error = %e, "failed to parse OpenAI stream chunk");
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
        let url = format!("{}/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) if response.status().as_u16() == 429 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}
