//! Error taxonomy for the booking engine.
//!
//! Domain errors propagate synchronously out of the state machines and
//! orchestrators; translating them into a transport representation is
//! the caller's job. Asynchronous side-effect failures (job enqueue,
//! notification dispatch) are *not* part of this taxonomy; they are
//! logged at the point of dispatch and never escalate into the primary
//! operation's result.

use crate::store::StoreError;
use std::fmt;
use thiserror::Error;

/// Errors raised by the booking workflow engine.
#[derive(Error, Debug)]
pub enum BookingError {
    /// A referenced entity does not exist.
    #[error("{resource} with id {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        resource: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The operation is incompatible with the entity's current state
    /// (terminal or duplicate), e.g. cancelling twice.
    #[error("{0}")]
    Conflict(String),

    /// The actor lacks authorization for the requested action.
    #[error("{0}")]
    Forbidden(String),

    /// The request is structurally valid but not processable: a
    /// cross-reference mismatch or a disallowed state transition.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// The input itself is invalid, e.g. an interval ending before it
    /// starts or a blocked-time overlap.
    #[error("{0}")]
    BadRequest(String),

    /// A persistence operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Creates a [`BookingError::NotFound`] for the given resource and id.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Creates a [`BookingError::Conflict`].
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a [`BookingError::Forbidden`].
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a [`BookingError::UnprocessableEntity`].
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity(message.into())
    }

    /// Creates a [`BookingError::BadRequest`].
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}
