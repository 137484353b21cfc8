//! Caller-supplied custom endpoint shapes.
//!
//! The contract here is intentionally loose: the endpoint is user-defined,
//! so content is read through a fallback chain (`content`, `text`,
//! `message`) and error bodies are not interpreted at all.

use serde_json::{json, Value};

use crate::api::{ChatRequest, Usage};
use crate::provider::{Endpoints, NormalizedReply};

/// Returned when none of the fallback fields carried a non-empty string.
pub const FALLBACK_CONTENT: &str = "Response received from custom API";

/// Fixed detail string for custom endpoint failures; arbitrary error bodies
/// are not worth guessing at.
pub const ERROR_DETAILS: &str = "Custom API error";

pub fn endpoint(_endpoints: &Endpoints, request: &ChatRequest) -> String {
    request.custom_api_url.clone().unwrap_or_default()
}

pub fn build_body(request: &ChatRequest, system_message: &str) -> Value {
    json!({
        "message": request.message,
        "system": system_message,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

pub fn parse_response(body: &Value) -> Result<NormalizedReply, String> {
    let content = ["content", "text", "message"]
        .iter()
        .find_map(|field| {
            body.get(field)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
        })
        .unwrap_or(FALLBACK_CONTENT)
        .to_string();

    let usage = body
        .get("usage")
        .and_then(|value| serde_json::from_value::<Usage>(value.clone()).ok())
        .unwrap_or_default();

    Ok(NormalizedReply { content, usage })
}

pub fn error_details(_body: &Value) -> String {
    ERROR_DETAILS.to_string()
}
