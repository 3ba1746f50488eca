//! Shopfront Core - Shared types library.
//!
//! This crate provides the types shared by every Shopfront component:
//! - `client` - REST client plus the session and cart stores
//! - `cli` - Terminal front end driving the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. Everything here mirrors the JSON the storefront backend speaks.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money helpers, roles, statuses and categories

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
