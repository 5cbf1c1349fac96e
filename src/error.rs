//! Error types for the account-desk client.

/// Top-level error type for the chat client.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Configuration could not be loaded, saved or validated.
    #[error("config error: {0}")]
    Config(String),

    /// The chat endpoint could not be reached or the exchange broke mid-way.
    #[error("transport error: {0}")]
    Transport(String),

    /// The chat endpoint answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not a valid chat response.
    #[error("decode error: {0}")]
    Decode(String),

    /// Speech synthesis or recognition failed.
    #[error("speech error: {0}")]
    Speech(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeskError {
    /// Whether this failure happened while talking to the chat backend.
    ///
    /// Both kinds collapse to the same user-visible error entry.
    #[must_use]
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_)
        )
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DeskError>;
