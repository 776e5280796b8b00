//! Module: error
//! Responsibility: structured runtime error classification for the buffer.
//! Does not own: error *messages* for the SQL layer above; this is an
//! internal taxonomy, not a client-facing protocol.
//! Boundary: every fallible operation in this crate returns `BufferError`.

use std::fmt;
use thiserror::Error as ThisError;

///
/// BufferError
///
/// Structured runtime error with a stable internal classification. Not a
/// stable wire format; callers should match on `class`/`origin`, not on the
/// message text.
///

#[derive(Debug, ThisError)]
#[error("{origin}:{class}: {message}")]
pub struct BufferError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl BufferError {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Operation called out of lifecycle order (e.g. `add_row` after `done`).
    #[must_use]
    pub fn invalid_state(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidState, origin, message)
    }

    /// A window parameter is outside its legal domain (e.g. FETCH PERCENT).
    #[must_use]
    pub fn invalid_value(field: &str, value: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::InvalidValue,
            ErrorOrigin::Window,
            format!("invalid value for {field}: {value}"),
        )
    }

    /// The spill backend raised a failure; propagated unchanged in spirit.
    #[must_use]
    pub fn backend_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BackendFailure, ErrorOrigin::Spill, message)
    }

    /// An invariant the buffer asserts internally was violated.
    #[must_use]
    pub fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self.class, ErrorClass::InvalidState)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification. Not a stable API.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidState,
    InvalidValue,
    BackendFailure,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidState => "invalid_state",
            Self::InvalidValue => "invalid_value",
            Self::BackendFailure => "backend_failure",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification. Not a stable API.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Buffer,
    Sort,
    Distinct,
    Spill,
    Lob,
    Session,
    Window,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Buffer => "buffer",
            Self::Sort => "sort",
            Self::Distinct => "distinct",
            Self::Spill => "spill",
            Self::Lob => "lob",
            Self::Session => "session",
            Self::Window => "window",
        };
        write!(f, "{label}")
    }
}
