//! Per-run session identifier.
//!
//! One [`SessionId`] is generated when the client starts and attached
//! unchanged to every chat request, so the research service can keep one
//! conversation per client run. Nothing is persisted; collisions are not
//! checked.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const PREFIX: &str = "sess_";
const SUFFIX_LEN: usize = 11;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque session identifier of the form `sess_<base36>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate an identifier from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        Self(format!("{PREFIX}{suffix}"))
    }

    /// Wrap an existing identifier (e.g. one given on the command line).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generated_id_has_prefix_and_base36_suffix() {
        let id = SessionId::generate();
        let suffix = id.as_str().strip_prefix(PREFIX).unwrap_or_default();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let a = SessionId::generate_with(&mut rand::rngs::StdRng::seed_from_u64(7));
        let b = SessionId::generate_with(&mut rand::rngs::StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = SessionId::from_raw("sess_abc");
        assert_eq!(
            serde_json::to_value(&id).ok(),
            Some(serde_json::json!("sess_abc"))
        );
    }
}
