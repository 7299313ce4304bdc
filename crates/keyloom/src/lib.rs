//! ## Crate layout
//! - `core`: derivation pipeline (normalize → synthesize → probe), serial
//!   allocation, assignment service, scope-move propagation, the store
//!   abstraction, and observability counters.
//! - `error`: the stable public error taxonomy mapped from the core's
//!   internal classification.
//!
//! The `prelude` module mirrors the surface a tracker backend uses when it
//! creates, re-keys, and moves keyed entities.

pub use keyloom_core as core;

mod error;

pub use error::{ConflictKind, Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        ConflictKind, Error, ErrorKind,
        core::{
            assign::KeySession,
            key::{ItemKey, ProjectKey},
            normalize::normalize,
            probe::{KeySource, make_unique},
            relocate::{ClearSprintAssignments, MoveReport, PostMoveHook, relocate},
            serial::next_serial,
            store::{EntityId, ItemRecord, KeyStore, MemoryStore, ProjectRecord, ScopeId},
            synthesize::{synthesize, synthesize_default},
        },
    };
}
