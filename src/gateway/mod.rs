//! The dispatch gateway.
//!
//! One call in, one upstream call out, one normalized envelope back. The
//! gateway owns no state beyond a shared HTTP client and the provider
//! endpoint table; credentials arrive with each request and are never
//! stored or logged. There is no retry, no fan-out, and no timeout beyond
//! what the transport itself enforces.

use std::error::Error;
use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ChatRequest, ChatResponse, ErrorBody};
use crate::provider::{
    augment_system_message, classify_model, descriptor, simulated, Endpoints, ProviderKind,
};
use crate::utils::auth::apply_auth_headers;

/// Body text for the 400 returned when a required field is missing or empty.
pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: model, apiKey, and message are required.";

/// Error label used for every upstream and transport failure envelope.
pub const REQUEST_FAILED_LABEL: &str = "API Request Failed";

/// Everything that can go wrong on the way to a normalized response.
///
/// There is deliberately no variant for unrecognized models: those degrade
/// to a simulated reply instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A required field was missing; detected before any network call.
    Validation(String),
    /// The provider rejected the request, or reported an error inside a 200
    /// body. The status mirrors what the upstream returned.
    Upstream { status: u16, details: String },
    /// Network failure or a response body that was not parseable JSON.
    Transport(String),
}

impl GatewayError {
    /// HTTP status this error maps to on the inbound surface.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::Validation(_) => 400,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) => 500,
        }
    }

    /// The JSON error envelope for this failure.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            GatewayError::Validation(message) => ErrorBody {
                error: message.clone(),
                details: None,
            },
            GatewayError::Upstream { details, .. } => ErrorBody {
                error: REQUEST_FAILED_LABEL.to_string(),
                details: Some(details.clone()),
            },
            GatewayError::Transport(message) => ErrorBody {
                error: REQUEST_FAILED_LABEL.to_string(),
                details: Some(message.clone()),
            },
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Validation(message) => write!(f, "{message}"),
            GatewayError::Upstream { status, details } => {
                write!(f, "upstream request failed with status {status}: {details}")
            }
            GatewayError::Transport(message) => write!(f, "transport failure: {message}"),
        }
    }
}

impl Error for GatewayError {}

fn validate(request: &ChatRequest) -> Result<(), GatewayError> {
    if request.model.is_empty() || request.api_key.is_empty() || request.message.is_empty() {
        return Err(GatewayError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
    }
    Ok(())
}

/// The dispatch gateway: a pooled HTTP client plus the provider endpoint
/// table, constructed once and shared across requests.
pub struct Gateway {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Route one chat request to its provider and normalize the outcome.
    ///
    /// Exactly one upstream call is issued per invocation, and none at all
    /// for validation failures or simulated replies.
    pub async fn dispatch(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        validate(request)?;

        let kind = classify_model(&request.model, request.custom_api_url.as_deref());
        let Some(desc) = descriptor(kind) else {
            debug!(model = %request.model, "unrecognized model, returning simulated response");
            return Ok(simulated::reply(request));
        };

        let system_message = augment_system_message(&request.system_message);
        let url = (desc.endpoint)(&self.endpoints, request);
        let body = (desc.build_body)(request, &system_message);

        let started = Instant::now();
        let builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        let response = apply_auth_headers(builder, kind, &request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body_reports_error = desc.body_error_is_failure
            && payload.get("error").is_some_and(|value| !value.is_null());
        if !status.is_success() || body_reports_error {
            let details = (desc.error_details)(&payload);
            warn!(
                provider = desc.display_name,
                model = %request.model,
                status = status.as_u16(),
                "upstream request failed"
            );
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                details,
            });
        }

        let reply = (desc.parse_response)(&payload).map_err(GatewayError::Transport)?;
        let timing = started.elapsed().as_millis() as u64;

        info!(
            provider = desc.display_name,
            model = %request.model,
            status = status.as_u16(),
            elapsed_ms = timing,
            "dispatch completed"
        );

        // The custom branch echoes the literal "custom" identifier; every
        // other branch echoes the requested model.
        let model = if kind == ProviderKind::Custom {
            "custom".to_string()
        } else {
            request.model.clone()
        };

        Ok(ChatResponse {
            content: reply.content,
            model,
            usage: reply.usage,
            timing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Usage, DEFAULT_SYSTEM_MESSAGE};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn gateway_for(server: &Server) -> Gateway {
        let url = server.url();
        Gateway::with_endpoints(Endpoints {
            anthropic: url.clone(),
            openai: url.clone(),
            google: url.clone(),
            groq: url,
        })
    }

    fn request(body: serde_json::Value) -> ChatRequest {
        serde_json::from_value(body).unwrap()
    }

    fn augmented_default_system() -> String {
        augment_system_message(DEFAULT_SYSTEM_MESSAGE)
    }

    #[tokio::test]
    async fn anthropic_round_trip() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "k")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::Json(json!({
                "model": "claude-3-7-sonnet",
                "max_tokens": 1024,
                "temperature": 0.7,
                "system": augmented_default_system(),
                "messages": [{ "role": "user", "content": "hi" }],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": [{ "type": "text", "text": "hello" }],
                    "usage": { "prompt_tokens": 5, "completion_tokens": 7, "total_tokens": 12 },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let response = gateway
            .dispatch(&request(json!({
                "model": "claude-3-7-sonnet",
                "apiKey": "k",
                "message": "hi",
            })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "hello");
        assert_eq!(response.model, "claude-3-7-sonnet");
        assert_eq!(
            response.usage,
            Usage { prompt_tokens: 5, completion_tokens: 7, total_tokens: 12 }
        );
    }

    #[tokio::test]
    async fn openai_request_shape_and_bearer_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "system", "content": augmented_default_system() },
                    { "role": "user", "content": "hi" },
                ],
                "max_tokens": 1024,
                "temperature": 0.7,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{ "message": { "role": "assistant", "content": "hey" } }],
                    "usage": { "prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3 },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let response = gateway
            .dispatch(&request(json!({
                "model": "gpt-4o",
                "apiKey": "sk-test",
                "message": "hi",
            })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "hey");
        assert_eq!(response.usage.total_tokens, 3);
    }

    #[tokio::test]
    async fn groq_uses_the_openai_compatible_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gk")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama-3.3-70b-versatile",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{ "message": { "content": "fast" } }],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let response = gateway
            .dispatch(&request(json!({
                "model": "llama-3.3-70b-versatile",
                "apiKey": "gk",
                "message": "hi",
            })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "fast");
        assert_eq!(response.usage, Usage::default());
    }

    #[tokio::test]
    async fn google_request_shape_and_query_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-pro:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
            .match_body(Matcher::Json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [{
                        "text": format!("{}\n\nUser query: hi", augmented_default_system()),
                    }],
                }],
                "generationConfig": { "temperature": 0.7, "maxOutputTokens": 1024 },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{ "content": { "parts": [{ "text": "bonjour" }] } }],
                    "usageMetadata": { "totalTokenCount": 21 },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let response = gateway
            .dispatch(&request(json!({
                "model": "gemini-pro",
                "apiKey": "g-key",
                "message": "hi",
            })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "bonjour");
        assert_eq!(
            response.usage,
            Usage { prompt_tokens: 0, completion_tokens: 0, total_tokens: 21 }
        );
    }

    #[tokio::test]
    async fn missing_fields_fail_before_any_network_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let incomplete = [
            json!({ "apiKey": "k", "message": "hi" }),
            json!({ "model": "gpt-4o", "message": "hi" }),
            json!({ "model": "gpt-4o", "apiKey": "k" }),
            json!({ "model": "", "apiKey": "k", "message": "hi" }),
        ];

        for body in incomplete {
            let err = gateway.dispatch(&request(body)).await.unwrap_err();
            assert_eq!(
                err,
                GatewayError::Validation(MISSING_FIELDS_MESSAGE.to_string())
            );
            assert_eq!(err.status(), 400);
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_model_yields_simulated_reply() {
        let gateway = Gateway::new();
        let response = gateway
            .dispatch(&request(json!({
                "model": "foo-bar",
                "apiKey": "k",
                "message": "ping",
            })))
            .await
            .unwrap();

        assert_eq!(response.content, "I'm responding to your message: \"ping\"");
        assert_eq!(response.model, "foo-bar");
        assert_eq!(
            response.usage,
            Usage { prompt_tokens: 10, completion_tokens: 20, total_tokens: 30 }
        );
        assert_eq!(response.timing, 500);
    }

    #[tokio::test]
    async fn custom_endpoint_fallback_chain_and_model_echo() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("authorization", "Bearer ck")
            .match_body(Matcher::Json(json!({
                "message": "hi",
                "system": augmented_default_system(),
                "temperature": 0.7,
                "max_tokens": 1024,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "text": "hi there" }).to_string())
            .create_async()
            .await;

        let gateway = Gateway::new();
        let response = gateway
            .dispatch(&request(json!({
                "model": "custom",
                "apiKey": "ck",
                "message": "hi",
                "customApiUrl": format!("{}/hook", server.url()),
            })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "hi there");
        assert_eq!(response.model, "custom");
        assert_eq!(response.usage, Usage::default());
    }

    #[tokio::test]
    async fn custom_without_url_degrades_to_simulated() {
        let gateway = Gateway::new();
        let response = gateway
            .dispatch(&request(json!({
                "model": "custom",
                "apiKey": "k",
                "message": "hi",
            })))
            .await
            .unwrap();
        assert_eq!(response.timing, 500);
        assert_eq!(response.model, "custom");
    }

    #[tokio::test]
    async fn google_error_in_200_body_is_a_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/gemini-pro:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": { "message": "quota exceeded" } }).to_string())
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let err = gateway
            .dispatch(&request(json!({
                "model": "gemini-pro",
                "apiKey": "g-key",
                "message": "hi",
            })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream { status: 200, details: "quota exceeded".to_string() }
        );
    }

    #[tokio::test]
    async fn upstream_status_is_mirrored_with_extracted_details() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": { "message": "invalid x-api-key" } }).to_string())
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let err = gateway
            .dispatch(&request(json!({
                "model": "claude-3-7-sonnet",
                "apiKey": "bad",
                "message": "hi",
            })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream { status: 401, details: "invalid x-api-key".to_string() }
        );
        assert_eq!(err.status(), 401);
    }

    #[tokio::test]
    async fn upstream_error_without_message_uses_placeholder() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(json!({ "status": "rate limited" }).to_string())
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let err = gateway
            .dispatch(&request(json!({
                "model": "gpt-4o",
                "apiKey": "k",
                "message": "hi",
            })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream { status: 429, details: "Unknown error".to_string() }
        );
    }

    #[tokio::test]
    async fn custom_endpoint_failure_uses_fixed_details() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(json!({ "error": { "message": "ignored" } }).to_string())
            .create_async()
            .await;

        let gateway = Gateway::new();
        let err = gateway
            .dispatch(&request(json!({
                "model": "custom",
                "apiKey": "k",
                "message": "hi",
                "customApiUrl": format!("{}/hook", server.url()),
            })))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream { status: 500, details: "Custom API error".to_string() }
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        let gateway = Gateway::with_endpoints(Endpoints {
            anthropic: "http://127.0.0.1:9".to_string(),
            ..Endpoints::default()
        });

        let err = gateway
            .dispatch(&request(json!({
                "model": "claude-3-7-sonnet",
                "apiKey": "k",
                "message": "hi",
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(err.status(), 500);
    }

    #[tokio::test]
    async fn non_json_body_is_a_transport_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let err = gateway
            .dispatch(&request(json!({
                "model": "gpt-4o",
                "apiKey": "k",
                "message": "hi",
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn identical_requests_match_except_for_timing() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .expect(2)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{ "message": { "content": "stable" } }],
                    "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 },
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server);
        let body = json!({ "model": "gpt-4o", "apiKey": "k", "message": "hi" });
        let mut first = gateway.dispatch(&request(body.clone())).await.unwrap();
        let mut second = gateway.dispatch(&request(body)).await.unwrap();

        first.timing = 0;
        second.timing = 0;
        assert_eq!(first, second);
    }

    #[test]
    fn error_envelopes_match_the_wire_contract() {
        let validation = GatewayError::Validation(MISSING_FIELDS_MESSAGE.to_string());
        assert_eq!(validation.to_body().error, MISSING_FIELDS_MESSAGE);
        assert_eq!(validation.to_body().details, None);

        let upstream = GatewayError::Upstream { status: 429, details: "slow down".to_string() };
        assert_eq!(upstream.to_body().error, REQUEST_FAILED_LABEL);
        assert_eq!(upstream.to_body().details.as_deref(), Some("slow down"));

        let transport = GatewayError::Transport("connection refused".to_string());
        assert_eq!(transport.status(), 500);
        assert_eq!(
            transport.to_body().details.as_deref(),
            Some("connection refused")
        );
    }
}
