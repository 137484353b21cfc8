//! OpenAI Chat Completions shapes, shared with Groq.
//!
//! Groq exposes an OpenAI-compatible surface, so both kinds share the body
//! builder and response parser and differ only in base URL.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ChatRequest, Usage};
use crate::provider::{Endpoints, NormalizedReply};
use crate::utils::url::construct_api_url;

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

pub fn openai_endpoint(endpoints: &Endpoints, _request: &ChatRequest) -> String {
    construct_api_url(&endpoints.openai, "chat/completions")
}

pub fn groq_endpoint(endpoints: &Endpoints, _request: &ChatRequest) -> String {
    construct_api_url(&endpoints.groq, "chat/completions")
}

pub fn build_body(request: &ChatRequest, system_message: &str) -> Value {
    json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": system_message },
            { "role": "user", "content": request.message },
        ],
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
    })
}

pub fn parse_response(body: &Value) -> Result<NormalizedReply, String> {
    let response: ChatCompletionsResponse = serde_json::from_value(body.clone())
        .map_err(|e| format!("unexpected chat completions response shape: {e}"))?;

    let content = response
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .ok_or_else(|| "chat completions response carried no choices".to_string())?;

    Ok(NormalizedReply {
        content,
        usage: response.usage.unwrap_or_default(),
    })
}
