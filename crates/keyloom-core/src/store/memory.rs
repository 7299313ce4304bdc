use crate::{
    error::InternalError,
    key::{ItemKey, ProjectKey},
    store::{
        EntityId, ITEM_KEY_CONSTRAINT, ItemRecord, KeyStore, PROJECT_KEY_CONSTRAINT,
        ProjectRecord, ScopeId,
    },
};
use std::collections::{BTreeMap, BTreeSet};

///
/// MemoryStore
///
/// Reference [`KeyStore`] backed by in-process tables. Identities are a
/// per-store sequence, uniqueness constraints are checked on every write,
/// and transactions are snapshot/restore: the store is cloned before the
/// closure runs and restored wholesale on error.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    projects: BTreeMap<EntityId, ProjectRecord>,
    items: BTreeMap<EntityId, ItemRecord>,
    next_id: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId::new(self.next_id)
    }

    fn project_key_taken(
        &self,
        scope: &ScopeId,
        key: &ProjectKey,
        exclude: Option<EntityId>,
    ) -> bool {
        self.projects.values().any(|record| {
            Some(record.id) != exclude && record.scope == *scope && record.key == *key
        })
    }

    fn item_key_taken(&self, project: EntityId, key: &ItemKey, exclude: Option<EntityId>) -> bool {
        self.items.values().any(|record| {
            Some(record.id) != exclude && record.project == project && record.key == *key
        })
    }
}

impl KeyStore for MemoryStore {
    fn project(&self, id: EntityId) -> Result<ProjectRecord, InternalError> {
        self.projects
            .get(&id)
            .cloned()
            .ok_or_else(|| InternalError::store_not_found("project", id))
    }

    fn project_keys(
        &self,
        scope: &ScopeId,
        exclude: Option<EntityId>,
    ) -> Result<BTreeSet<ProjectKey>, InternalError> {
        Ok(self
            .projects
            .values()
            .filter(|record| Some(record.id) != exclude && record.scope == *scope)
            .map(|record| record.key.clone())
            .collect())
    }

    fn insert_project(
        &mut self,
        scope: ScopeId,
        name: String,
        key: ProjectKey,
    ) -> Result<ProjectRecord, InternalError> {
        if self.project_key_taken(&scope, &key, None) {
            return Err(InternalError::unique_violation(
                PROJECT_KEY_CONSTRAINT,
                key.as_str(),
            ));
        }

        let record = ProjectRecord {
            id: self.mint_id(),
            scope,
            name,
            key,
        };
        self.projects.insert(record.id, record.clone());

        Ok(record)
    }

    fn update_project(&mut self, record: &ProjectRecord) -> Result<(), InternalError> {
        if !self.projects.contains_key(&record.id) {
            return Err(InternalError::store_not_found("project", record.id));
        }
        if self.project_key_taken(&record.scope, &record.key, Some(record.id)) {
            return Err(InternalError::unique_violation(
                PROJECT_KEY_CONSTRAINT,
                record.key.as_str(),
            ));
        }

        self.projects.insert(record.id, record.clone());

        Ok(())
    }

    fn items(&self, project: EntityId) -> Result<Vec<ItemRecord>, InternalError> {
        Ok(self
            .items
            .values()
            .filter(|record| record.project == project)
            .cloned()
            .collect())
    }

    fn item_keys(&self, project: EntityId) -> Result<Vec<ItemKey>, InternalError> {
        Ok(self
            .items
            .values()
            .filter(|record| record.project == project)
            .map(|record| record.key.clone())
            .collect())
    }

    fn insert_item(
        &mut self,
        project: EntityId,
        key: ItemKey,
    ) -> Result<ItemRecord, InternalError> {
        if !self.projects.contains_key(&project) {
            return Err(InternalError::store_not_found("project", project));
        }
        if self.item_key_taken(project, &key, None) {
            return Err(InternalError::unique_violation(
                ITEM_KEY_CONSTRAINT,
                key.to_string(),
            ));
        }

        let record = ItemRecord {
            id: self.mint_id(),
            project,
            key,
            sprint: None,
        };
        self.items.insert(record.id, record.clone());

        Ok(record)
    }

    fn update_item(&mut self, record: &ItemRecord) -> Result<(), InternalError> {
        if !self.items.contains_key(&record.id) {
            return Err(InternalError::store_not_found("item", record.id));
        }
        if self.item_key_taken(record.project, &record.key, Some(record.id)) {
            return Err(InternalError::unique_violation(
                ITEM_KEY_CONSTRAINT,
                record.key.to_string(),
            ));
        }

        self.items.insert(record.id, record.clone());

        Ok(())
    }

    fn rewrite_item_prefix(
        &mut self,
        project: EntityId,
        old: &ProjectKey,
        new: &ProjectKey,
    ) -> Result<u64, InternalError> {
        let mut rewritten = 0u64;

        for record in self.items.values_mut() {
            if record.project == project && record.key.parent() == old {
                record.key = record.key.with_parent(new.clone());
                rewritten += 1;
            }
        }

        Ok(rewritten)
    }

    fn clear_sprint_assignments(&mut self, project: EntityId) -> Result<u64, InternalError> {
        let mut cleared = 0u64;

        for record in self.items.values_mut() {
            if record.project == project && record.sprint.take().is_some() {
                cleared += 1;
            }
        }

        Ok(cleared)
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

///
/// TESTS
///
