//! # Gateway Providers
//!
//! Upstream adapters for the three provider families the gateway dispatches
//! to:
//! - OpenAI-compatible (`/v1/chat/completions`, `/v1/completions`, `/v1/responses`)
//! - Anthropic (`/v1/messages`)
//! - Google AI / Vertex AI (Gemini)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod registry;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "google")]
pub mod google;

// Re-export main types
pub use registry::{ProviderEntry, ProviderRegistry};

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

#[cfg(feature = "google")]
pub use google::GoogleProvider;
