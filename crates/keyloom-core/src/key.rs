use crate::{
    MAX_KEY_LEN,
    error::{ErrorOrigin, InternalError},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// KeyError
///
/// Field-level format violations for caller-supplied keys. These map onto
/// the messages surfaced to end users; triggering conditions are part of
/// the contract, wording is a UI concern.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("key must not be empty")]
    Empty,

    #[error("item key must be of the form KEY-NUMBER")]
    MalformedItemKey,

    #[error("key must contain only letters (A-Z)")]
    NotLetters,

    #[error("key must be at most {MAX_KEY_LEN} characters")]
    TooLong,
}

impl From<KeyError> for InternalError {
    fn from(err: KeyError) -> Self {
        Self::validation(ErrorOrigin::Key, err.to_string())
    }
}

///
/// ProjectKey
///
/// Short human-legible identifier for a named entity, unique within its
/// scope. Uppercase ASCII letters only, at most [`MAX_KEY_LEN`] of them.
/// Caller-supplied input is trimmed and uppercased before validation.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Normalize and validate a caller-supplied key.
    ///
    /// Format checks run in caller-visible order: letters-only first, then
    /// the length bound.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let key = input.trim().to_ascii_uppercase();

        if key.is_empty() {
            return Err(KeyError::Empty);
        }
        if !key.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(KeyError::NotLetters);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(KeyError::TooLong);
        }

        Ok(Self(key))
    }

    /// Wrap a candidate produced by the derivation pipeline.
    ///
    /// Derived candidates are uppercase letters within bounds by
    /// construction; this is not a validation entry point.
    pub(crate) fn from_derived(key: String) -> Self {
        debug_assert!(
            !key.is_empty()
                && key.len() <= MAX_KEY_LEN
                && key.bytes().all(|b| b.is_ascii_uppercase()),
            "derived key must be canonical: {key:?}"
        );

        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ProjectKey> for String {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

impl TryFrom<String> for ProjectKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

///
/// ItemKey
///
/// Dependent identifier embedding a parent key as a literal prefix:
/// `{PARENT}-{N}`. Unique within the parent entity. When the parent's key
/// changes, every item key is rewritten by swapping the prefix; the serial
/// number is stable for the item's lifetime.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[display("{parent}-{number}")]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey {
    parent: ProjectKey,
    number: u64,
}

impl ItemKey {
    #[must_use]
    pub const fn new(parent: ProjectKey, number: u64) -> Self {
        Self { parent, number }
    }

    /// Normalize and validate a caller-supplied item key.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let key = input.trim().to_ascii_uppercase();

        let Some((prefix, digits)) = key.rsplit_once('-') else {
            return Err(KeyError::MalformedItemKey);
        };

        let parent = ProjectKey::parse(prefix)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::MalformedItemKey);
        }
        let number = digits.parse().map_err(|_| KeyError::MalformedItemKey)?;

        Ok(Self { parent, number })
    }

    #[must_use]
    pub const fn parent(&self) -> &ProjectKey {
        &self.parent
    }

    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// The same serial number under a different parent key.
    #[must_use]
    pub const fn with_parent(&self, parent: ProjectKey) -> Self {
        Self {
            parent,
            number: self.number,
        }
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ItemKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

///
/// TESTS
///
