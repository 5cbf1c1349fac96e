//! Speech input and output adapters.
//!
//! Both directions are backed by platform speech programs found at startup.
//! Detection happens once and yields a [`Capability`]; the chat loop wires a
//! control only when its capability is [`Capability::Available`].

pub mod input;
pub mod output;

use std::path::{Path, PathBuf};

pub use input::{
    CommandRecognizer, ListenState, RecognitionEvent, RecognitionRun, RecognitionUpdate, SpeechInput,
    SpeechRecognizer,
};
pub use output::{CommandSynthesizer, Speaker, SpeechSynthesizer, Utterance, spoken_text};

/// Result of probing for a platform capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    /// The capability is present.
    Available(T),
    /// The capability is absent; `reason` is shown next to the disabled control.
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// The reason the capability is missing, if it is.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Self::Available(v) => Capability::Available(f(v)),
            Self::Unavailable { reason } => Capability::Unavailable { reason },
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Resolve a program: an explicit path must exist, a bare name goes through `PATH`.
pub(crate) fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}
