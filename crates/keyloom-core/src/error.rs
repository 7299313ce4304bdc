use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; the facade crate maps this into the public taxonomy.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a field-level validation error.
    pub(crate) fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    /// Construct a terminal conflict (the caller must choose differently).
    pub(crate) fn conflict(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, origin, message)
    }

    /// Construct a store-origin invariant violation.
    pub(crate) fn store_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Store,
            message,
        )
    }

    /// Construct a lost-race conflict carrying the violated constraint.
    ///
    /// This is the one retryable condition in the taxonomy: the uniqueness
    /// constraint rejected a write that probing had judged free.
    pub(crate) fn unique_violation(constraint: &'static str, key: impl Into<String>) -> Self {
        let violation = UniqueViolation {
            constraint,
            key: key.into(),
        };

        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Store,
            message: violation.to_string(),
            detail: Some(ErrorDetail::Unique(violation)),
        }
    }

    /// Construct the fatal keyspace-exhaustion error.
    pub(crate) fn probe_exhausted(base: &str) -> Self {
        Self::new(
            ErrorClass::Internal,
            ErrorOrigin::Probe,
            format!("unable to derive a free key for base '{base}'"),
        )
    }

    pub fn store_not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Store,
            format!("{entity} not found: {id}"),
        )
    }

    /// True when this error is the lost-race condition a caller may redo the
    /// generate step for.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::Unique(_)))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
/// This enum is intentionally extensible.
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Unique(UniqueViolation),
}

///
/// UniqueViolation
///
/// A write rejected by a uniqueness constraint. Never returned directly;
/// always wrapped in [`ErrorDetail::Unique`].
///

#[derive(Clone, Debug, ThisError)]
#[error("unique constraint violated: {constraint} (key '{key}')")]
pub struct UniqueViolation {
    pub constraint: &'static str,
    pub key: String,
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Internal,
    InvariantViolation,
    NotFound,
    Validation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Assign,
    Key,
    Move,
    Probe,
    Scope,
    Serial,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Assign => "assign",
            Self::Key => "key",
            Self::Move => "move",
            Self::Probe => "probe",
            Self::Scope => "scope",
            Self::Serial => "serial",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
