//! Core runtime for Keyloom: key derivation, workspace-scoped uniqueness
//! probing, serial dependent identifiers, scope-move propagation, and the
//! store abstraction the engine runs against.
#![warn(unreachable_pub)]

pub mod assign;
pub mod error;
pub mod key;
pub mod normalize;
pub mod obs;
pub mod probe;
pub mod relocate;
pub mod serial;
pub mod store;
pub mod synthesize;

///
/// CONSTANTS
///

/// Shortest key tried when deriving from a single word.
pub const MIN_KEY_LEN: usize = 3;

/// Hard upper bound on stored key length.
///
/// Probing never emits a key longer than this, and explicit keys above it
/// are rejected before they reach the store.
pub const MAX_KEY_LEN: usize = 6;

/// Key used when a name contains no ASCII letters at all.
pub const FALLBACK_KEY: &str = "PRJ";

/// Number of words contributing to an initials-strategy candidate.
pub const INITIALS_CAP: usize = 6;

/// Attempts made by the generate-and-insert loop before a lost race is
/// surfaced to the caller.
pub const MAX_INSERT_ATTEMPTS: u32 = 3;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, sessions, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        key::{ItemKey, ProjectKey},
        probe::KeySource,
        store::{EntityId, ItemRecord, ProjectRecord, ScopeId},
    };
}
