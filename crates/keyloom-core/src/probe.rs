//! Uniqueness probing: escalate a derived candidate until a free slot is
//! found in the scope's key set.
//!
//! The prober works against a key set the caller fetched in one bulk read.
//! It is a best-effort pre-check; the store's uniqueness constraint remains
//! the final arbiter, and a write it rejects is retried by the assignment
//! layer with a freshly fetched set.

use crate::{
    MAX_KEY_LEN, MIN_KEY_LEN,
    error::InternalError,
    key::ProjectKey,
    normalize::normalize,
    obs::{self, MetricsEvent, ProbeStrategy},
    synthesize::synthesize_default,
};
use std::collections::BTreeSet;

// Stem lengths leave room for one or two suffix letters at the cap.
const SINGLE_SUFFIX_STEM: usize = MAX_KEY_LEN - 1;
const DOUBLE_SUFFIX_STEM: usize = MAX_KEY_LEN - 2;

const SUFFIX_ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S',
    'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

///
/// KeySource
///
/// The normalized material a key is derived from. Multi-word sources try
/// the initials strategy before falling back to the escalation ladder over
/// the concatenated letters.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeySource {
    tokens: Vec<String>,
}

impl KeySource {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self {
            tokens: normalize(name),
        }
    }

    #[must_use]
    pub const fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn is_multi_word(&self) -> bool {
        self.tokens.len() > 1
    }

    /// All letters available to the escalation ladder, uppercased.
    ///
    /// Multi-word sources concatenate every token; a source with no tokens
    /// degrades to the fallback constant.
    fn base_letters(&self) -> String {
        if self.tokens.is_empty() {
            crate::FALLBACK_KEY.to_string()
        } else {
            self.tokens.concat().to_ascii_uppercase()
        }
    }
}

/// Find the first key derived from `source` that is absent from `existing`.
///
/// Escalation order is fixed:
/// 1. multi-word sources try their initials candidate;
/// 2. truncations of the base letters, lengths [`MIN_KEY_LEN`]..=[`MAX_KEY_LEN`];
/// 3. a five-letter stem plus one suffix letter `A`..=`Z`;
/// 4. a four-letter stem plus two suffix letters, lexicographic.
///
/// Exhausting stage 4 is a fatal internal error, not a recoverable state.
pub fn make_unique(
    existing: &BTreeSet<ProjectKey>,
    source: &KeySource,
) -> Result<ProjectKey, InternalError> {
    if source.is_multi_word() {
        let candidate = ProjectKey::from_derived(synthesize_default(source.tokens()));
        if !existing.contains(&candidate) {
            obs::record(MetricsEvent::ProbeResolved {
                strategy: ProbeStrategy::Initials,
            });
            return Ok(candidate);
        }
    }

    let base = source.base_letters();

    for length in MIN_KEY_LEN..=MAX_KEY_LEN {
        let candidate = ProjectKey::from_derived(base.chars().take(length).collect());
        if !existing.contains(&candidate) {
            obs::record(MetricsEvent::ProbeResolved {
                strategy: ProbeStrategy::Truncation,
            });
            return Ok(candidate);
        }
    }

    let stem: String = base.chars().take(SINGLE_SUFFIX_STEM).collect();
    for suffix in SUFFIX_ALPHABET {
        let candidate = ProjectKey::from_derived(format!("{stem}{suffix}"));
        if !existing.contains(&candidate) {
            obs::record(MetricsEvent::ProbeResolved {
                strategy: ProbeStrategy::SingleSuffix,
            });
            return Ok(candidate);
        }
    }

    let stem: String = base.chars().take(DOUBLE_SUFFIX_STEM).collect();
    for first in SUFFIX_ALPHABET {
        for second in SUFFIX_ALPHABET {
            let candidate = ProjectKey::from_derived(format!("{stem}{first}{second}"));
            if !existing.contains(&candidate) {
                obs::record(MetricsEvent::ProbeResolved {
                    strategy: ProbeStrategy::DoubleSuffix,
                });
                return Ok(candidate);
            }
        }
    }

    obs::record(MetricsEvent::ProbeExhausted);
    Err(InternalError::probe_exhausted(&base))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys<const N: usize>(raw: [&str; N]) -> BTreeSet<ProjectKey> {
        raw.into_iter()
            .map(|k| ProjectKey::parse(k).unwrap())
            .collect()
    }

    fn probe(existing: &BTreeSet<ProjectKey>, name: &str) -> ProjectKey {
        make_unique(existing, &KeySource::from_name(name)).unwrap()
    }

    #[test]
    fn empty_scope_takes_first_candidate() {
        assert_eq!(probe(&BTreeSet::new(), "Marketing").as_str(), "MAR");
        assert_eq!(probe(&BTreeSet::new(), "Super Cool Project").as_str(), "SCP");
    }

    #[test]
    fn single_word_collisions_escalate_length() {
        // Sequential creations: Marketing, Market Research, Marketplace,
        // Marketable.
        let mut existing = BTreeSet::new();

        let a = probe(&existing, "Marketing");
        assert_eq!(a.as_str(), "MAR");
        existing.insert(a);

        let b = probe(&existing, "Market Research");
        assert_eq!(b.as_str(), "MR");
        existing.insert(b);

        let c = probe(&existing, "Marketplace");
        assert_eq!(c.as_str(), "MARK");
        existing.insert(c);

        let d = probe(&existing, "Marketable");
        assert_eq!(d.as_str(), "MARKE");
    }

    #[test]
    fn multi_word_falls_back_to_base_letters_when_initials_taken() {
        let existing = keys(["MR"]);

        // Base letters are the concatenated words: MARKETRESEARCH.
        assert_eq!(probe(&existing, "Market Research").as_str(), "MAR");
    }

    #[test]
    fn all_lengths_taken_appends_suffix_letter() {
        let existing = keys(["MAR", "MARK", "MARKE", "MARKET"]);

        assert_eq!(probe(&existing, "Marketing").as_str(), "MARKEA");
    }

    #[test]
    fn single_suffix_exhausted_uses_two_letters() {
        let mut existing = keys(["MAR", "MARK", "MARKE", "MARKET"]);
        for suffix in SUFFIX_ALPHABET {
            existing.insert(ProjectKey::parse(&format!("MARKE{suffix}")).unwrap());
        }

        assert_eq!(probe(&existing, "Marketing").as_str(), "MARKAA");
    }

    #[test]
    fn full_exhaustion_is_fatal() {
        let mut existing = keys(["MAR", "MARK", "MARKE", "MARKET"]);
        for suffix in SUFFIX_ALPHABET {
            existing.insert(ProjectKey::parse(&format!("MARKE{suffix}")).unwrap());
        }
        for first in SUFFIX_ALPHABET {
            for second in SUFFIX_ALPHABET {
                existing.insert(ProjectKey::parse(&format!("MARK{first}{second}")).unwrap());
            }
        }

        let err = make_unique(&existing, &KeySource::from_name("Marketing")).unwrap_err();
        assert_eq!(err.class, crate::error::ErrorClass::Internal);
        assert!(err.message.contains("MARKETING"));
    }

    #[test]
    fn short_base_repeats_truncations_then_suffixes() {
        // A two-letter base yields the same candidate at every truncation
        // rung; the suffix stage resolves it.
        let existing = keys(["AB"]);

        assert_eq!(probe(&existing, "Ab").as_str(), "ABA");
    }

    #[test]
    fn from_tokens_matches_from_name() {
        let from_tokens = KeySource::from_tokens(crate::normalize::normalize("Super Cool Project"));

        assert_eq!(from_tokens, KeySource::from_name("Super Cool Project"));
    }

    #[test]
    fn nameless_input_probes_from_fallback() {
        assert_eq!(probe(&BTreeSet::new(), "!!!").as_str(), "PRJ");

        let existing = keys(["PRJ"]);
        assert_eq!(probe(&existing, "!!!").as_str(), "PRJA");
    }

    proptest! {
        #[test]
        fn never_returns_an_occupied_key(
            name in "[ -~]{0,24}",
            raw in proptest::collection::btree_set("[A-Z]{3,6}", 0..64),
        ) {
            let existing: BTreeSet<ProjectKey> = raw
                .into_iter()
                .map(|k| ProjectKey::parse(&k).unwrap())
                .collect();

            let key = make_unique(&existing, &KeySource::from_name(&name)).unwrap();

            prop_assert!(!existing.contains(&key));
        }

        #[test]
        fn always_returns_a_well_formed_key(name in "[ -~]{0,24}") {
            let key = make_unique(&BTreeSet::new(), &KeySource::from_name(&name)).unwrap();

            prop_assert!(!key.as_str().is_empty());
            prop_assert!(key.as_str().len() <= MAX_KEY_LEN);
            prop_assert!(key.as_str().bytes().all(|b| b.is_ascii_uppercase()));
        }
    }
}
