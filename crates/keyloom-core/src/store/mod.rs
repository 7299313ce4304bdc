mod memory;

pub use memory::MemoryStore;

use crate::{
    error::{ErrorOrigin, InternalError},
    key::{ItemKey, ProjectKey},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

/// Constraint labels carried by unique-violation errors.
pub const PROJECT_KEY_CONSTRAINT: &str = "project workspace/key";
pub const ITEM_KEY_CONSTRAINT: &str = "item project/key";

///
/// ScopeIdError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ScopeIdError {
    #[error("scope id contains control characters")]
    ContainsControl,

    #[error("scope id must not be empty")]
    Empty,

    #[error("scope id is too long")]
    TooLong,
}

impl From<ScopeIdError> for InternalError {
    fn from(err: ScopeIdError) -> Self {
        Self::validation(ErrorOrigin::Scope, err.to_string())
    }
}

///
/// ScopeId
///
/// Opaque tenant boundary within which project keys must be unique.
/// Always passed explicitly; the engine never resolves a scope from
/// ambient state.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeId(String);

impl ScopeId {
    pub fn try_new(value: impl Into<String>) -> Result<Self, ScopeIdError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(ScopeIdError::Empty);
        }
        if trimmed.len() > 128 {
            return Err(ScopeIdError::TooLong);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ScopeIdError::ContainsControl);
        }

        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ScopeId> for String {
    fn from(scope: ScopeId) -> Self {
        scope.0
    }
}

impl TryFrom<String> for ScopeId {
    type Error = ScopeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

///
/// EntityId
///
/// Store-assigned numeric identity. Used for lookups and for excluding an
/// entity's own key from uniqueness checks during updates-in-place.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct EntityId(u64);

impl EntityId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

///
/// ProjectRecord
///
/// A named entity owning a derived or caller-supplied key, frozen after
/// assignment except for the single scope-move transition.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub id: EntityId,
    pub scope: ScopeId,
    pub name: String,
    pub key: ProjectKey,
}

///
/// ItemRecord
///
/// Dependent identifier carrier. `sprint` is the scope-bound association
/// the shipped post-move hook strips when the parent changes scope.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ItemRecord {
    pub id: EntityId,
    pub project: EntityId,
    pub key: ItemKey,
    pub sprint: Option<EntityId>,
}

///
/// KeyStore
///
/// Persistence collaborator for the key engine. Implementations must
/// enforce the `(scope, key)` and `(project, key)` uniqueness constraints
/// on every write path: probing is a best-effort pre-check, the constraint
/// is the final arbiter. A rejected write surfaces as a unique-violation
/// error ([`InternalError::is_unique_violation`]) so the assignment layer
/// can redo the generate step.
///

pub trait KeyStore {
    /// Look up one project record.
    fn project(&self, id: EntityId) -> Result<ProjectRecord, InternalError>;

    /// All project keys in `scope`, in one bulk read, optionally excluding
    /// the entity being updated.
    fn project_keys(
        &self,
        scope: &ScopeId,
        exclude: Option<EntityId>,
    ) -> Result<BTreeSet<ProjectKey>, InternalError>;

    /// Insert a new project under the `(scope, key)` constraint.
    fn insert_project(
        &mut self,
        scope: ScopeId,
        name: String,
        key: ProjectKey,
    ) -> Result<ProjectRecord, InternalError>;

    /// Replace an existing project record, re-checking the constraint
    /// against every other project in the record's scope.
    fn update_project(&mut self, record: &ProjectRecord) -> Result<(), InternalError>;

    /// All item records belonging to `project`.
    fn items(&self, project: EntityId) -> Result<Vec<ItemRecord>, InternalError>;

    /// All item keys belonging to `project`, in one bulk read.
    fn item_keys(&self, project: EntityId) -> Result<Vec<ItemKey>, InternalError>;

    /// Insert a new item under the `(project, key)` constraint.
    fn insert_item(
        &mut self,
        project: EntityId,
        key: ItemKey,
    ) -> Result<ItemRecord, InternalError>;

    /// Replace an existing item record, re-checking the constraint.
    fn update_item(&mut self, record: &ItemRecord) -> Result<(), InternalError>;

    /// Rewrite every item key of `project` embedding `old` as its prefix to
    /// embed `new` instead, as one bulk operation scoped to the parent.
    /// Returns the number of rewritten items.
    fn rewrite_item_prefix(
        &mut self,
        project: EntityId,
        old: &ProjectKey,
        new: &ProjectKey,
    ) -> Result<u64, InternalError>;

    /// Strip the sprint association from every item of `project`.
    /// Returns the number of items that carried one.
    fn clear_sprint_assignments(&mut self, project: EntityId) -> Result<u64, InternalError>;

    /// Run `f` atomically: on error every mutation made inside is undone.
    fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, InternalError>,
    ) -> Result<R, InternalError>
    where
        Self: Sized;
}

///
/// TESTS
///
