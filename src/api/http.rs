//! `reqwest` client for the research service.

use super::ChatBackend;
use super::contract::{ChatRequest, ChatResponse, HealthStatus};
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// HTTP chat backend.
///
/// No request timeout is applied: a request resolves whenever the transport
/// resolves or fails.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    chat_url: Url,
    health_url: Url,
}

impl HttpChatBackend {
    /// Create a client for the chat endpoint at `endpoint`.
    ///
    /// The health probe lives at `/health` on the same origin.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Config`] if `endpoint` is not a valid URL.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Like [`new`](Self::new) with a caller-provided client.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Config`] if `endpoint` is not a valid URL.
    pub fn with_client(endpoint: &str, client: reqwest::Client) -> Result<Self> {
        let chat_url = Url::parse(endpoint)
            .map_err(|e| DeskError::Config(format!("invalid endpoint `{endpoint}`: {e}")))?;
        let health_url = chat_url
            .join("/health")
            .map_err(|e| DeskError::Config(format!("cannot derive health URL: {e}")))?;
        Ok(Self {
            client,
            chat_url,
            health_url,
        })
    }

    #[must_use]
    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    #[must_use]
    pub fn health_url(&self) -> &Url {
        &self.health_url
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(
            url = %self.chat_url,
            session_id = %request.session_id,
            persona = %request.persona,
            "posting chat message"
        );
        let response = self
            .client
            .post(self.chat_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeskError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DeskError::Decode(e.to_string()))
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = self.client.get(self.health_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeskError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DeskError::Decode(e.to_string()))
    }
}
