//! Persona selection.
//!
//! A persona is a mode label forwarded unmodified to the research service,
//! which uses it to pick a reasoning style. The client never interprets it;
//! it only restricts the selection to the configured option set.

use std::fmt;

/// Persona used when nothing else is configured.
pub const DEFAULT_PERSONA: &str = "efficient";

/// Options the research service ships with.
pub const BUILTIN_PERSONAS: &[&str] = &["efficient", "confused", "chatty", "edge"];

/// Opaque persona label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Persona(String);

impl Persona {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The selector control: an option set plus the current choice.
#[derive(Debug, Clone)]
pub struct PersonaSelector {
    options: Vec<String>,
    current: Persona,
}

impl PersonaSelector {
    /// Build a selector. An empty option list accepts any non-empty label.
    #[must_use]
    pub fn new(options: Vec<String>, initial: Persona) -> Self {
        Self {
            options,
            current: initial,
        }
    }

    #[must_use]
    pub fn current(&self) -> &Persona {
        &self.current
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Select a persona by label (case-insensitive against the option set).
    ///
    /// Returns the newly selected persona, or `None` if the label is not offered.
    pub fn select(&mut self, label: &str) -> Option<&Persona> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let chosen = if self.options.is_empty() {
            label.to_owned()
        } else {
            self.options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(label))?
                .clone()
        };
        self.current = Persona::new(chosen);
        Some(&self.current)
    }
}
