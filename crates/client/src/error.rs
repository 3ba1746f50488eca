//! Store-level error handling.
//!
//! Store operations resolve every failure to a boolean (or `None`) plus a
//! notification. `StoreError` is what they log, and what the read-only
//! helpers (catalog, order history, admin listings) return directly.

use thiserror::Error;

use crate::api::ApiError;

/// Errors produced by the session, cart, catalog, order and admin stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation needs a signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Operation needs the administrator role.
    #[error("Forbidden: administrator role required")]
    Forbidden,

    /// The backend rejected the request or could not be reached.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

impl StoreError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
