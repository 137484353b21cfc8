//! Authentication for upstream API requests.
//!
//! Each provider kind carries its credential differently: Anthropic wants an
//! `x-api-key` header plus a pinned `anthropic-version`, Google takes the
//! key as a query parameter on the endpoint URL, and everyone else uses a
//! standard bearer token.

use crate::provider::{anthropic, ProviderKind};

/// Attach the provider-appropriate authentication to an upstream request.
///
/// Google gets no header here; its key is already embedded in the endpoint
/// URL by the provider descriptor.
pub fn apply_auth_headers(
    request: reqwest::RequestBuilder,
    kind: ProviderKind,
    api_key: &str,
) -> reqwest::RequestBuilder {
    match kind {
        ProviderKind::Anthropic => request
            .header("x-api-key", api_key)
            .header("anthropic-version", anthropic::API_VERSION),
        ProviderKind::Google => request,
        _ => request.header("Authorization", format!("Bearer {api_key}")),
    }
}
