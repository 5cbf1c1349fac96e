//! Wire types for the research service's chat endpoint.
//!
//! `POST /chat` takes `{session_id, message, persona}` and answers with
//! `{reply, mode, company?, account_plan?}`. `GET /health` answers
//! `{"status": "ok"}`.

use crate::plan::AccountPlan;
use serde::{Deserialize, Serialize};

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub persona: String,
}

/// Body of a successful chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    /// Conversation stage reported by the service (`discovery`, `research`, ...).
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_plan: Option<AccountPlan>,
}

impl ChatResponse {
    /// Company name, if the service reported a non-empty one.
    #[must_use]
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref().filter(|c| !c.is_empty())
    }

    /// Caption shown under the reply: `Mode: <mode>[ | Company: <company>]`.
    #[must_use]
    pub fn caption(&self) -> String {
        match self.company() {
            Some(company) => format!("Mode: {} | Company: {company}", self.mode),
            None => format!("Mode: {}", self.mode),
        }
    }
}

/// Body of the health probe response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
