//! Assignment service: the caller-facing layer that turns names and
//! explicit keys into stored records.
//!
//! Derivation runs inside a bounded generate-and-insert loop: probing is a
//! pre-check over a fetched key set, and when a concurrent writer wins the
//! slot between probe and insert, the store's uniqueness constraint rejects
//! the write and the loop re-fetches and regenerates, up to
//! [`MAX_INSERT_ATTEMPTS`] times. Explicit keys never retry; a collision
//! there is the caller's to resolve.

use crate::{
    MAX_INSERT_ATTEMPTS,
    error::{ErrorOrigin, InternalError},
    key::{ItemKey, ProjectKey},
    obs::{self, MetricsEvent},
    probe::{KeySource, make_unique},
    serial::next_serial,
    store::{
        EntityId, ITEM_KEY_CONSTRAINT, ItemRecord, KeyStore, PROJECT_KEY_CONSTRAINT,
        ProjectRecord, ScopeId,
    },
};

///
/// KeySession
///
/// Borrow of a store plus the assignment operations. Scope is always an
/// explicit parameter; the session carries no ambient tenant state.
///

pub struct KeySession<'a, S: KeyStore> {
    store: &'a mut S,
}

impl<'a, S: KeyStore> KeySession<'a, S> {
    #[must_use]
    pub const fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Create a project, deriving a key from `name` unless the caller
    /// supplied one explicitly.
    pub fn create_project(
        &mut self,
        scope: &ScopeId,
        name: &str,
        explicit_key: Option<&str>,
    ) -> Result<ProjectRecord, InternalError> {
        match explicit_key {
            Some(raw) => self.create_project_explicit(scope, name, raw),
            None => self.create_project_derived(scope, name),
        }
    }

    /// Replace an existing project's key with a caller-supplied one.
    ///
    /// The project's own current key is excluded from the collision check,
    /// so re-submitting an unchanged key is accepted.
    pub fn update_project_key(
        &mut self,
        id: EntityId,
        raw_key: &str,
    ) -> Result<ProjectRecord, InternalError> {
        let record = self.store.project(id)?;
        let key = ProjectKey::parse(raw_key)?;

        let existing = self.store.project_keys(&record.scope, Some(id))?;
        if existing.contains(&key) {
            return Err(Self::explicit_conflict());
        }

        let updated = ProjectRecord { key, ..record };
        self.store.update_project(&updated)?;

        Ok(updated)
    }

    /// Create an item under `project`, allocating the next serial key
    /// `{PROJECT_KEY}-{N}`.
    pub fn create_item(&mut self, project: EntityId) -> Result<ItemRecord, InternalError> {
        let parent = self.store.project(project)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let existing: Vec<String> = self
                .store
                .item_keys(project)?
                .iter()
                .map(ToString::to_string)
                .collect();
            let number = next_serial(
                existing.iter().map(String::as_str),
                parent.key.as_str(),
            );
            let key = ItemKey::new(parent.key.clone(), number);

            match self.store.insert_item(project, key) {
                Ok(record) => {
                    obs::record(MetricsEvent::SerialAllocated);
                    return Ok(record);
                }
                Err(err) if err.is_unique_violation() => {
                    obs::record(MetricsEvent::UniqueViolation {
                        constraint: ITEM_KEY_CONSTRAINT,
                    });
                    if attempt >= MAX_INSERT_ATTEMPTS {
                        return Err(err);
                    }
                    obs::record(MetricsEvent::InsertRetry { attempt });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The key a derived creation would get right now, without writing.
    pub fn preview_project_key(
        &self,
        scope: &ScopeId,
        name: &str,
    ) -> Result<ProjectKey, InternalError> {
        let existing = self.store.project_keys(scope, None)?;

        make_unique(&existing, &KeySource::from_name(name))
    }

    fn create_project_explicit(
        &mut self,
        scope: &ScopeId,
        name: &str,
        raw_key: &str,
    ) -> Result<ProjectRecord, InternalError> {
        let key = ProjectKey::parse(raw_key)?;

        let existing = self.store.project_keys(scope, None)?;
        if existing.contains(&key) {
            return Err(Self::explicit_conflict());
        }

        match self
            .store
            .insert_project(scope.clone(), name.to_string(), key)
        {
            Ok(record) => Ok(record),
            Err(err) if err.is_unique_violation() => {
                // A racer claimed the slot after the pre-check. For an
                // explicit key the outcome is the same as a pre-check hit:
                // the caller picks a different key.
                obs::record(MetricsEvent::UniqueViolation {
                    constraint: PROJECT_KEY_CONSTRAINT,
                });
                Err(Self::explicit_conflict())
            }
            Err(err) => Err(err),
        }
    }

    fn create_project_derived(
        &mut self,
        scope: &ScopeId,
        name: &str,
    ) -> Result<ProjectRecord, InternalError> {
        let source = KeySource::from_name(name);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let existing = self.store.project_keys(scope, None)?;
            let key = make_unique(&existing, &source)?;

            match self
                .store
                .insert_project(scope.clone(), name.to_string(), key)
            {
                Ok(record) => return Ok(record),
                Err(err) if err.is_unique_violation() => {
                    obs::record(MetricsEvent::UniqueViolation {
                        constraint: PROJECT_KEY_CONSTRAINT,
                    });
                    if attempt >= MAX_INSERT_ATTEMPTS {
                        return Err(err);
                    }
                    obs::record(MetricsEvent::InsertRetry { attempt });
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn explicit_conflict() -> InternalError {
        InternalError::conflict(
            ErrorOrigin::Assign,
            "a project with this key already exists in this workspace",
        )
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorClass,
        obs::{metrics_report, metrics_reset_all},
        store::MemoryStore,
    };
    use std::collections::BTreeSet;

    fn scope(name: &str) -> ScopeId {
        ScopeId::try_new(name).unwrap()
    }

    #[test]
    fn sequential_creations_escalate_as_specified() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);
        let ws = scope("acme");

        let names = ["Marketing", "Market Research", "Marketplace", "Marketable"];
        let keys: Vec<String> = names
            .iter()
            .map(|name| {
                session
                    .create_project(&ws, name, None)
                    .unwrap()
                    .key
                    .to_string()
            })
            .collect();

        assert_eq!(keys, ["MAR", "MR", "MARK", "MARKE"]);
    }

    #[test]
    fn explicit_key_is_normalized_and_stored() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);

        let record = session
            .create_project(&scope("acme"), "Tooling", Some("  tool "))
            .unwrap();

        assert_eq!(record.key.as_str(), "TOOL");
    }

    #[test]
    fn explicit_key_format_violations_are_validation_errors() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);
        let ws = scope("acme");

        let digit = session.create_project(&ws, "P", Some("PRJ1")).unwrap_err();
        assert_eq!(digit.class, ErrorClass::Validation);
        assert!(digit.message.contains("only letters"));

        let long = session.create_project(&ws, "P", Some("TOOLONG")).unwrap_err();
        assert_eq!(long.class, ErrorClass::Validation);
        assert!(long.message.contains("at most"));
    }

    #[test]
    fn explicit_collision_is_a_terminal_conflict() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);
        let ws = scope("acme");

        session.create_project(&ws, "Engineering", Some("ENG")).unwrap();
        let err = session.create_project(&ws, "Engines", Some("ENG")).unwrap_err();

        assert_eq!(err.class, ErrorClass::Conflict);
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn resubmitting_own_key_on_update_is_accepted() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);
        let ws = scope("acme");

        let record = session.create_project(&ws, "Engineering", Some("ENG")).unwrap();
        let updated = session.update_project_key(record.id, "ENG").unwrap();
        assert_eq!(updated.key.as_str(), "ENG");

        let other = session.create_project(&ws, "Design", Some("DES")).unwrap();
        let err = session.update_project_key(other.id, "ENG").unwrap_err();
        assert_eq!(err.class, ErrorClass::Conflict);
    }

    #[test]
    fn item_keys_are_serial_per_project() {
        let mut store = MemoryStore::new();
        let mut session = KeySession::new(&mut store);
        let ws = scope("acme");

        let project = session.create_project(&ws, "Engineering", Some("ENG")).unwrap();

        assert_eq!(session.create_item(project.id).unwrap().key.to_string(), "ENG-1");
        assert_eq!(session.create_item(project.id).unwrap().key.to_string(), "ENG-2");
    }

    #[test]
    fn item_serial_resumes_after_highest_existing() {
        let mut store = MemoryStore::new();
        let project = {
            let mut session = KeySession::new(&mut store);
            session
                .create_project(&scope("acme"), "Engineering", Some("ENG"))
                .unwrap()
        };
        store
            .insert_item(project.id, ItemKey::parse("ENG-5").unwrap())
            .unwrap();

        let mut session = KeySession::new(&mut store);
        assert_eq!(session.create_item(project.id).unwrap().key.to_string(), "ENG-6");
    }

    #[test]
    fn preview_does_not_write() {
        let mut store = MemoryStore::new();
        let session = KeySession::new(&mut store);
        let ws = scope("acme");

        let preview = session.preview_project_key(&ws, "Marketing").unwrap();
        assert_eq!(preview.as_str(), "MAR");
        assert!(store.project_keys(&ws, None).unwrap().is_empty());
    }

    ///
    /// ContendedStore
    ///
    /// Test double that loses the probe-to-insert race a configurable
    /// number of times by letting a rival claim the slot first.
    ///

    #[derive(Clone)]
    struct ContendedStore {
        inner: MemoryStore,
        contention: u32,
    }

    impl ContendedStore {
        fn new(contention: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                contention,
            }
        }
    }

    impl KeyStore for ContendedStore {
        fn project(&self, id: EntityId) -> Result<ProjectRecord, InternalError> {
            self.inner.project(id)
        }

        fn project_keys(
            &self,
            scope: &ScopeId,
            exclude: Option<EntityId>,
        ) -> Result<BTreeSet<ProjectKey>, InternalError> {
            self.inner.project_keys(scope, exclude)
        }

        fn insert_project(
            &mut self,
            scope: ScopeId,
            name: String,
            key: ProjectKey,
        ) -> Result<ProjectRecord, InternalError> {
            if self.contention > 0 {
                self.contention -= 1;
                self.inner
                    .insert_project(scope.clone(), "Rival".into(), key.clone())?;
            }
            self.inner.insert_project(scope, name, key)
        }

        fn update_project(&mut self, record: &ProjectRecord) -> Result<(), InternalError> {
            self.inner.update_project(record)
        }

        fn items(&self, project: EntityId) -> Result<Vec<ItemRecord>, InternalError> {
            self.inner.items(project)
        }

        fn item_keys(&self, project: EntityId) -> Result<Vec<ItemKey>, InternalError> {
            self.inner.item_keys(project)
        }

        fn insert_item(
            &mut self,
            project: EntityId,
            key: ItemKey,
        ) -> Result<ItemRecord, InternalError> {
            self.inner.insert_item(project, key)
        }

        fn update_item(&mut self, record: &ItemRecord) -> Result<(), InternalError> {
            self.inner.update_item(record)
        }

        fn rewrite_item_prefix(
            &mut self,
            project: EntityId,
            old: &ProjectKey,
            new: &ProjectKey,
        ) -> Result<u64, InternalError> {
            self.inner.rewrite_item_prefix(project, old, new)
        }

        fn clear_sprint_assignments(&mut self, project: EntityId) -> Result<u64, InternalError> {
            self.inner.clear_sprint_assignments(project)
        }

        fn transaction<R>(
            &mut self,
            f: impl FnOnce(&mut Self) -> Result<R, InternalError>,
        ) -> Result<R, InternalError> {
            let snapshot = self.clone();

            match f(self) {
                Ok(value) => Ok(value),
                Err(err) => {
                    *self = snapshot;
                    Err(err)
                }
            }
        }
    }

    #[test]
    fn lost_race_retries_with_a_fresh_key_set() {
        metrics_reset_all();

        let mut store = ContendedStore::new(1);
        let mut session = KeySession::new(&mut store);

        let record = session
            .create_project(&scope("acme"), "Marketing", None)
            .unwrap();

        // The rival took MAR; the retry re-fetched and escalated.
        assert_eq!(record.key.as_str(), "MARK");

        let counters = metrics_report().counters;
        assert_eq!(counters.unique_violations, 1);
        assert_eq!(counters.insert_retries, 1);
    }

    #[test]
    fn three_straight_losses_surface_the_retryable_conflict() {
        let mut store = ContendedStore::new(u32::MAX);
        let mut session = KeySession::new(&mut store);

        let err = session
            .create_project(&scope("acme"), "Marketing", None)
            .unwrap_err();

        assert!(err.is_unique_violation());
    }
}
