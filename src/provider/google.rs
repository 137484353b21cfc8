//! Google Generative Language API shapes.
//!
//! Gemini has no system role in this API version, so the system message is
//! folded into the single user turn. Authentication is a `key` query
//! parameter, not a header, and usage reporting only carries a total count.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ChatRequest, Usage};
use crate::provider::{Endpoints, NormalizedReply};
use crate::utils::url::normalize_base_url;

/// Returned when a 200 body carries no candidates (safety blocks, mostly).
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u64,
}

pub fn endpoint(endpoints: &Endpoints, request: &ChatRequest) -> String {
    format!(
        "{}/models/{}:generateContent?key={}",
        normalize_base_url(&endpoints.google),
        request.model,
        request.api_key
    )
}

pub fn build_body(request: &ChatRequest, system_message: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": format!("{system_message}\n\nUser query: {}", request.message) }],
        }],
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens,
        },
    })
}

/// Never fails: a body without candidates normalizes to a fixed placeholder,
/// and usage is synthesized from `usageMetadata.totalTokenCount` alone with
/// no prompt/completion split.
pub fn parse_response(body: &Value) -> Result<NormalizedReply, String> {
    let response: GenerateContentResponse =
        serde_json::from_value(body.clone()).unwrap_or_default();

    let content = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.parts.first())
        .map(|part| part.text.clone())
        .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());

    let total_tokens = response
        .usage_metadata
        .map(|metadata| metadata.total_token_count)
        .unwrap_or(0);

    Ok(NormalizedReply {
        content,
        usage: Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens,
        },
    })
}
