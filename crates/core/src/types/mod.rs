//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use category::{CategoryError, ProductCategory};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{format_money, line_total};
pub use status::*;
