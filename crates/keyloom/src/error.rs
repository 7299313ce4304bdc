use derive_more::Display;
use keyloom_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// True when the caller can redo the generate-and-insert sequence:
    /// a concurrent writer won the slot between probe and write.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict(ConflictKind::LostRace))
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = if err.is_unique_violation() {
            ErrorKind::Conflict(ConflictKind::LostRace)
        } else {
            match err.class {
                ErrorClass::Conflict => ErrorKind::Conflict(ConflictKind::ExplicitKey),
                ErrorClass::NotFound => ErrorKind::NotFound,
                ErrorClass::Validation => ErrorKind::Validation,
                ErrorClass::Internal | ErrorClass::InvariantViolation => ErrorKind::Internal,
            }
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Conflict(ConflictKind),

    /// The caller cannot remediate this.
    Internal,

    NotFound,

    /// A field-level rule was violated; the caller re-submits.
    Validation,
}

///
/// ConflictKind
///

#[remain::sorted]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ConflictKind {
    /// A caller-chosen key is already used in the scope; pick another.
    ExplicitKey,

    /// A concurrent insert won the slot; redo the generate step.
    LostRace,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Assign,
    Key,
    Move,
    Probe,
    Scope,
    Serial,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Assign => Self::Assign,
            CoreErrorOrigin::Key => Self::Key,
            CoreErrorOrigin::Move => Self::Move,
            CoreErrorOrigin::Probe => Self::Probe,
            CoreErrorOrigin::Scope => Self::Scope,
            CoreErrorOrigin::Serial => Self::Serial,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///
