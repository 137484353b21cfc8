//! Wire-level payloads shared by the HTTP surface and the dispatch gateway.
//!
//! Inbound fields keep the camelCase names of the browser-facing contract
//! (`apiKey`, `systemMessage`, `maxTokens`, `customApiUrl`); the normalized
//! response and usage block use snake_case, matching what chat UIs already
//! consume from OpenAI-style APIs.

use serde::{Deserialize, Serialize};

/// Default system message applied when the caller omits one.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant.";

fn default_system_message() -> String {
    DEFAULT_SYSTEM_MESSAGE.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

/// A provider-agnostic chat request.
///
/// `model`, `apiKey`, and `message` are required; the gateway rejects a
/// request missing any of them before touching the network. Everything else
/// has a serde default so sparse request bodies deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_system_message")]
    pub system_message: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_api_url: Option<String>,
}

/// Token accounting as reported by the upstream provider.
///
/// Every field defaults to zero: providers that report usage in an
/// incompatible shape (Anthropic's `input_tokens`/`output_tokens`, say) or
/// not at all simply come through zero-filled. No token counting happens
/// anywhere in this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// The normalized success envelope returned for every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
    /// Wall-clock milliseconds between issuing the upstream call and
    /// finishing parsing its response.
    pub timing: u64,
}

/// The error envelope returned for every failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
