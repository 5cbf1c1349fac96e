//! Last conversation stage reported by the research service.

use crate::api::ChatResponse;
use std::fmt;

/// Mode and company from the most recent successful reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationStatus {
    pub mode: Option<String>,
    pub company: Option<String>,
}

impl ConversationStatus {
    /// Take mode and company from a reply. A reply without a company keeps
    /// the one already known.
    pub fn update(&mut self, response: &ChatResponse) {
        self.mode = Some(response.mode.clone());
        if let Some(company) = response.company() {
            self.company = Some(company.to_owned());
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode: {}", self.mode.as_deref().unwrap_or("unknown"))?;
        if let Some(company) = &self.company {
            write!(f, " | Company: {company}")?;
        }
        Ok(())
    }
}
