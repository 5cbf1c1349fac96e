//! Chat backend contract and clients.
//!
//! The research service is an external collaborator reached through one
//! `POST` endpoint. [`ChatBackend`] is the seam the chat loop talks to;
//! [`http::HttpChatBackend`] is the production implementation.

pub mod contract;
pub mod http;

use crate::error::Result;
use async_trait::async_trait;

pub use contract::{ChatRequest, ChatResponse, HealthStatus};
pub use http::HttpChatBackend;

/// A service that answers chat requests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message. Non-success statuses are errors; there is no retry.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Probe the service's health endpoint.
    async fn health(&self) -> Result<HealthStatus>;
}
