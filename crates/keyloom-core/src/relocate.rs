//! Scope-move propagation.
//!
//! Moving a project between workspaces keeps its key only if the key is
//! free in the destination; otherwise a new key is probed against the
//! destination's key set, and every dependent item key embedding the old
//! key as a prefix is rewritten in one bulk pass. The parent update, the
//! rewrite, and the post-move hooks all run inside a single store
//! transaction, so a failure anywhere leaves nothing half-applied.

use crate::{
    error::InternalError,
    key::ProjectKey,
    obs::{self, MetricsEvent},
    probe::{KeySource, make_unique},
    store::{EntityId, KeyStore, ProjectRecord, ScopeId},
};
use serde::Serialize;

///
/// MoveReport
///
/// What a completed move did: the scopes involved, the key before and
/// after, and how many dependents were rewritten.
///

#[derive(Clone, Debug, Serialize)]
pub struct MoveReport {
    pub project: EntityId,
    pub from: ScopeId,
    pub to: ScopeId,
    pub old_key: ProjectKey,
    pub new_key: ProjectKey,
    pub dependents_rewritten: u64,
}

impl MoveReport {
    #[must_use]
    pub fn key_changed(&self) -> bool {
        self.old_key != self.new_key
    }
}

///
/// PostMoveHook
///
/// Business policy run after the key mechanics of a move, inside the same
/// transaction. Scope-bound associations that do not survive a move are
/// stripped here rather than inside the propagator itself.
///

pub trait PostMoveHook<S: KeyStore> {
    fn after_move(&self, store: &mut S, report: &MoveReport) -> Result<(), InternalError>;
}

///
/// ClearSprintAssignments
///
/// Sprints belong to the source workspace, so items keep no sprint
/// assignment across a move.
///

pub struct ClearSprintAssignments;

impl<S: KeyStore> PostMoveHook<S> for ClearSprintAssignments {
    fn after_move(&self, store: &mut S, report: &MoveReport) -> Result<(), InternalError> {
        store.clear_sprint_assignments(report.project)?;

        Ok(())
    }
}

/// Move `project` into `target`, rewriting dependents if the key changes
/// and running `hooks` afterwards, all atomically.
pub fn relocate<S: KeyStore>(
    store: &mut S,
    project: EntityId,
    target: &ScopeId,
    hooks: &[&dyn PostMoveHook<S>],
) -> Result<MoveReport, InternalError> {
    let report = store.transaction(|store| {
        let record = store.project(project)?;
        let from = record.scope.clone();
        let old_key = record.key.clone();

        let destination_keys = store.project_keys(target, Some(project))?;
        let new_key = if destination_keys.contains(&old_key) {
            make_unique(&destination_keys, &KeySource::from_name(&record.name))?
        } else {
            old_key.clone()
        };

        let dependents_rewritten = if new_key == old_key {
            0
        } else {
            store.rewrite_item_prefix(project, &old_key, &new_key)?
        };

        let updated = ProjectRecord {
            scope: target.clone(),
            key: new_key.clone(),
            ..record
        };
        store.update_project(&updated)?;

        let report = MoveReport {
            project,
            from,
            to: target.clone(),
            old_key,
            new_key,
            dependents_rewritten,
        };

        for hook in hooks {
            hook.after_move(store, &report)?;
        }

        Ok(report)
    })?;

    obs::record(MetricsEvent::MoveFinished {
        key_changed: report.key_changed(),
        dependents_rewritten: report.dependents_rewritten,
    });

    Ok(report)
}

///
/// TESTS
///
