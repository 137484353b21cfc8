//! HTTP surface for the dispatch gateway.
//!
//! One route does the work: `POST /api/chat` takes a provider-agnostic
//! request and answers with the normalized envelope or a structured error.
//! `GET /health` exists for deployment probes. A dropped connection drops
//! the handler future; the in-flight upstream call is not cancelled
//! server-side.

use std::error::Error;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::api::ChatRequest;
use crate::gateway::{Gateway, GatewayError};

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<Gateway>,
}

/// Build the application router around one shared gateway.
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(AppState {
            gateway: Arc::new(gateway),
        })
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    match state.gateway.dispatch(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

/// Bind the listener and serve until the process is stopped.
pub async fn run(listen: &str, gateway: Gateway) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(gateway)).await?;
    Ok(())
}
