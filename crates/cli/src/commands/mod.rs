//! Subcommand implementations.
//!
//! Store operations report their own outcome through the notifier; a
//! command only turns a reported failure into a non-zero exit.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod session;

use shopfront_client::{Access, AccessDecision, StoreError, Storefront};
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The store already told the user what went wrong.
    #[error("{0}")]
    Failed(&'static str),

    /// Signed-in state does not allow the command.
    #[error("{0}")]
    Denied(&'static str),

    /// Nothing matched the given ID.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turn a store's success flag into a command result.
pub const fn reported(ok: bool, what: &'static str) -> Result<(), CommandError> {
    if ok { Ok(()) } else { Err(CommandError::Failed(what)) }
}

/// Check route-style access before running a command.
pub fn guard(shop: &Storefront, access: Access) -> Result<(), CommandError> {
    match shop.session().require(access) {
        AccessDecision::Granted => Ok(()),
        AccessDecision::NeedsLogin => Err(CommandError::Denied("Please login first (shop login <username>)")),
        AccessDecision::Forbidden => {
            Err(CommandError::Denied("You don't have permission to access this page."))
        }
    }
}
