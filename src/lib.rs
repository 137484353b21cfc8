//! Passerelle is a stateless HTTP gateway that forwards chat requests to
//! remote LLM provider APIs and normalizes whatever comes back.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`gateway`] owns dispatch: validating a request, selecting a provider,
//!   issuing the single upstream call, and mapping the outcome into a
//!   normalized envelope or a structured error.
//! - [`provider`] classifies model identifiers into provider kinds and holds
//!   the per-provider descriptors (endpoint, payload shape, response parsing)
//!   the gateway dispatches through.
//! - [`server`] exposes the gateway over HTTP as `POST /api/chat`.
//! - [`api`] defines the wire-level request, response, and error payloads
//!   shared by the server and the gateway.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and starts the
//! server loop.

pub mod api;
pub mod cli;
pub mod core;
pub mod gateway;
pub mod provider;
pub mod server;
pub mod utils;
