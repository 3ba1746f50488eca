//! The storefront context handed to every view.
//!
//! Views receive this explicitly instead of reaching for globals. It wires
//! the session store, the cart store and the read-side helpers to one API
//! client and one notifier.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::admin::AdminConsole;
use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::notify::Notifier;
use crate::orders::Orders;
use crate::persist::{FileTokenStore, TokenStore};
use crate::session::SessionStore;

/// Everything a view needs. Cheap to clone.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
    catalog: Catalog,
    orders: Orders,
    admin: AdminConsole,
    cart_sync: JoinHandle<()>,
}

impl Drop for StorefrontInner {
    fn drop(&mut self) {
        self.cart_sync.abort();
    }
}

impl Storefront {
    /// Build the context from configuration, persisting the token to
    /// `config.token_file`.
    ///
    /// Must be called from within a Tokio runtime: the cart store starts
    /// following the session immediately.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ApiError> {
        let tokens = Arc::new(FileTokenStore::new(&config.token_file));
        Self::with_token_store(config, tokens, notifier)
    }

    /// Build the context with a caller-supplied token store.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn with_token_store(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(config)?;
        let session = SessionStore::new(api.clone(), tokens, notifier.clone());
        let cart = CartStore::new(api.clone(), session.clone(), notifier.clone());
        let catalog = Catalog::new(api.clone(), config.catalog_ttl);
        let orders = Orders::new(api.clone(), session.clone(), notifier.clone());
        let admin = AdminConsole::new(api.clone(), session.clone(), catalog.clone(), notifier);
        let cart_sync = cart.bind();

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                api,
                session,
                cart,
                catalog,
                orders,
                admin,
                cart_sync,
            }),
        })
    }

    /// Sign out. The cart mirror is empty when this returns, without waiting
    /// for the bound cart task.
    pub fn logout(&self) {
        self.inner.session.logout();
        self.inner.cart.reset();
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &Orders {
        &self.inner.orders
    }

    #[must_use]
    pub fn admin(&self) -> &AdminConsole {
        &self.inner.admin
    }
}
