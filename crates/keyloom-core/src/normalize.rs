//! Name normalization: the first stage of key derivation.
//!
//! A human-supplied name is reduced to an ordered sequence of
//! letters-only tokens. Case is preserved here; folding happens when a
//! candidate is synthesized.

/// Split a name into letters-only tokens.
///
/// Words are split on whitespace; every character that is not an ASCII
/// letter is stripped from each word; words that become empty are dropped.
/// Word order is preserved. Infallible — a name with no ASCII letters
/// produces an empty sequence, which the synthesizer resolves via the
/// fallback constant.
#[must_use]
pub fn normalize(name: &str) -> Vec<String> {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphabetic)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

///
/// TESTS
///
