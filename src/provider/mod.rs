//! Provider classification and dispatch descriptors.
//!
//! The model identifier is resolved once into a closed [`ProviderKind`] by a
//! pure function, and the gateway then dispatches through a static table of
//! [`ProviderDescriptor`] entries. Adding a provider is a data change here,
//! not a new branch in the gateway.

pub mod anthropic;
pub mod custom;
pub mod google;
pub mod openai;
pub mod simulated;

use serde_json::Value;

use crate::api::{ChatRequest, Usage};

/// Fixed suffix appended to every system message before it goes upstream,
/// regardless of provider. It discourages models from structuring replies
/// with section headers the chat UI renders poorly.
pub const SYSTEM_MESSAGE_SUFFIX: &str = "You are a helpful assistant. Provide direct, clear responses without using section headers like \"Response\" or \"Tasks & Code\".";

/// Append the fixed no-section-headers suffix to a caller-supplied system
/// message.
pub fn augment_system_message(system_message: &str) -> String {
    format!("{system_message}\n{SYSTEM_MESSAGE_SUFFIX}")
}

/// The closed set of upstreams a request can resolve to.
///
/// `Simulated` is not a real upstream: it marks identifiers that matched no
/// known provider and degrade to a locally fabricated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Google,
    Groq,
    Custom,
    Simulated,
}

/// Resolve a model identifier to a provider kind. First match wins.
///
/// `custom` only routes to the caller-supplied endpoint when a non-empty
/// URL accompanies it; otherwise it falls through to the simulated reply
/// like any other unrecognized identifier.
pub fn classify_model(model: &str, custom_api_url: Option<&str>) -> ProviderKind {
    if model.starts_with("claude") {
        ProviderKind::Anthropic
    } else if model.starts_with("gpt") {
        ProviderKind::OpenAi
    } else if model.starts_with("gemini") {
        ProviderKind::Google
    } else if model.starts_with("llama") {
        ProviderKind::Groq
    } else if model == "custom" && custom_api_url.is_some_and(|url| !url.is_empty()) {
        ProviderKind::Custom
    } else {
        ProviderKind::Simulated
    }
}

/// Base URLs for the fixed upstream APIs.
///
/// Tests point these at stub servers; production code uses the defaults.
/// The custom provider has no entry here since its URL arrives with the
/// request.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub anthropic: String,
    pub openai: String,
    pub google: String,
    pub groq: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            anthropic: "https://api.anthropic.com".to_string(),
            openai: "https://api.openai.com/v1".to_string(),
            google: "https://generativelanguage.googleapis.com/v1".to_string(),
            groq: "https://api.groq.com/openai/v1".to_string(),
        }
    }
}

/// Content and usage extracted from one upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReply {
    pub content: String,
    pub usage: Usage,
}

/// Everything the gateway needs to talk to one upstream.
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub display_name: &'static str,
    /// Full URL for the chat endpoint, including any query-string auth.
    pub endpoint: fn(&Endpoints, &ChatRequest) -> String,
    /// Upstream request body; the second argument is the already-augmented
    /// system message.
    pub build_body: fn(&ChatRequest, &str) -> Value,
    /// Extract content and usage from a successful upstream body. An `Err`
    /// means the body did not have the provider's documented shape and is
    /// surfaced as a transport-class failure.
    pub parse_response: fn(&Value) -> Result<NormalizedReply, String>,
    /// Best-effort error message pulled from an upstream error body.
    pub error_details: fn(&Value) -> String,
    /// Whether an `error` field in an otherwise-200 body counts as a
    /// failure. Google reports quota and safety errors this way.
    pub body_error_is_failure: bool,
}

static DESCRIPTORS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        kind: ProviderKind::Anthropic,
        display_name: "Anthropic",
        endpoint: anthropic::endpoint,
        build_body: anthropic::build_body,
        parse_response: anthropic::parse_response,
        error_details: extract_error_details,
        body_error_is_failure: false,
    },
    ProviderDescriptor {
        kind: ProviderKind::OpenAi,
        display_name: "OpenAI",
        endpoint: openai::openai_endpoint,
        build_body: openai::build_body,
        parse_response: openai::parse_response,
        error_details: extract_error_details,
        body_error_is_failure: false,
    },
    ProviderDescriptor {
        kind: ProviderKind::Google,
        display_name: "Google",
        endpoint: google::endpoint,
        build_body: google::build_body,
        parse_response: google::parse_response,
        error_details: extract_error_details,
        body_error_is_failure: true,
    },
    ProviderDescriptor {
        kind: ProviderKind::Groq,
        display_name: "Groq",
        endpoint: openai::groq_endpoint,
        build_body: openai::build_body,
        parse_response: openai::parse_response,
        error_details: extract_error_details,
        body_error_is_failure: false,
    },
    ProviderDescriptor {
        kind: ProviderKind::Custom,
        display_name: "custom",
        endpoint: custom::endpoint,
        build_body: custom::build_body,
        parse_response: custom::parse_response,
        error_details: custom::error_details,
        body_error_is_failure: false,
    },
];

/// Look up the descriptor for a provider kind.
///
/// `Simulated` has none; the gateway answers it locally without a network
/// call.
pub fn descriptor(kind: ProviderKind) -> Option<&'static ProviderDescriptor> {
    DESCRIPTORS.iter().find(|d| d.kind == kind)
}

/// Pull a human-readable message out of an upstream error body.
///
/// Providers usually report `{"error": {"message": ...}}`; some flatten the
/// error to a plain string. Anything else falls back to a fixed placeholder.
pub fn extract_error_details(body: &Value) -> String {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .unwrap_or("Unknown error")
        .to_string()
}
