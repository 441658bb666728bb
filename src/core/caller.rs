//! Authenticated caller identity.
//!
//! Token issuance and verification happen outside this crate. Whatever sits in
//! front of the core (an HTTP layer, a CLI) resolves the request to an optional
//! user id and hands it over as a [`Caller`]. Every core operation is scoped by
//! it, and ownership is always taken from here rather than from request payloads.

use crate::errors::{Error, Result};

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Primary key of the authenticated user
    pub user_id: i64,
}

impl Caller {
    /// Wraps an already-authenticated user id.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    /// Converts the outcome of authentication into a caller.
    ///
    /// # Errors
    /// Returns [`Error::Unauthenticated`] when no identity was resolved.
    pub fn from_identity(user_id: Option<i64>) -> Result<Self> {
        user_id.map(Self::new).ok_or(Error::Unauthenticated)
    }
}
