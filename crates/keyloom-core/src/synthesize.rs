//! Candidate synthesis: tokens in, one uppercase candidate out.
//!
//! Pure and deterministic. Uniqueness is the prober's job; this stage
//! never looks at existing keys.

use crate::{FALLBACK_KEY, INITIALS_CAP, MIN_KEY_LEN};

/// Derive a candidate key from normalized tokens.
///
/// Multi-word names use the initials strategy: the first letter of each of
/// the first [`INITIALS_CAP`] tokens. A single word contributes its first
/// `preferred_length` letters. No tokens at all yields [`FALLBACK_KEY`].
#[must_use]
pub fn synthesize(tokens: &[String], preferred_length: usize) -> String {
    if tokens.len() > 1 {
        tokens
            .iter()
            .take(INITIALS_CAP)
            .filter_map(|word| word.chars().next())
            .collect::<String>()
            .to_ascii_uppercase()
    } else if let Some(word) = tokens.first() {
        word.chars()
            .take(preferred_length)
            .collect::<String>()
            .to_ascii_uppercase()
    } else {
        FALLBACK_KEY.to_string()
    }
}

/// [`synthesize`] at the default single-word prefix length.
#[must_use]
pub fn synthesize_default(tokens: &[String]) -> String {
    synthesize(tokens, MIN_KEY_LEN)
}

///
/// TESTS
///
