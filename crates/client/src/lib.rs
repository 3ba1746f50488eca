//! Shopfront client library.
//!
//! Client-side state for the storefront: a typed REST client plus the two
//! stores views read from.
//!
//! - [`session::SessionStore`] - who is signed in, and their roles
//! - [`cart::CartStore`] - backend-synchronized mirror of their cart
//!
//! Views get both through a [`context::Storefront`], along with the catalog,
//! order history and admin console helpers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopfront_client::{ClientConfig, Storefront, TracingNotifier};
//! use shopfront_core::ProductId;
//!
//! let config = ClientConfig::from_env()?;
//! let shop = Storefront::new(&config, Arc::new(TracingNotifier))?;
//!
//! if shop.session().login("alice", "correctpw").await {
//!     shop.cart().add_item(ProductId::new(7), 1).await;
//!     println!("{} items", shop.cart().item_count());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod notify;
pub mod orders;
pub mod persist;
pub mod session;

pub use cart::{CartSnapshot, CartStore};
pub use config::{ClientConfig, ConfigError};
pub use context::Storefront;
pub use error::StoreError;
pub use notify::{Level, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{Access, AccessDecision, Identity, RegistrationForm, SessionSnapshot, SessionStore};
