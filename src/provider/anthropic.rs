//! Anthropic Messages API shapes.
//!
//! Authentication rides in `x-api-key` plus a pinned `anthropic-version`
//! header (see [`crate::utils::auth`]); the system message travels in a
//! top-level `system` field rather than a message role.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ChatRequest, Usage};
use crate::provider::{Endpoints, NormalizedReply};
use crate::utils::url::construct_api_url;

/// API version pinned for every Messages call.
pub const API_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub fn endpoint(endpoints: &Endpoints, _request: &ChatRequest) -> String {
    construct_api_url(&endpoints.anthropic, "v1/messages")
}

pub fn build_body(request: &ChatRequest, system_message: &str) -> Value {
    json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
        "system": system_message,
        "messages": [{ "role": "user", "content": request.message }],
    })
}

pub fn parse_response(body: &Value) -> Result<NormalizedReply, String> {
    let response: MessagesResponse = serde_json::from_value(body.clone())
        .map_err(|e| format!("unexpected Anthropic response shape: {e}"))?;

    let content = response
        .content
        .first()
        .map(|block| block.text.clone())
        .ok_or_else(|| "Anthropic response carried no content blocks".to_string())?;

    Ok(NormalizedReply {
        content,
        usage: response.usage.unwrap_or_default(),
    })
}
