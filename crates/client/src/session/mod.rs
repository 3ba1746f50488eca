//! Session store: who the current user is.
//!
//! The store owns the bearer token, the username and the granted roles. They
//! live in a single [`Identity`] value, so a half-authenticated state cannot
//! be represented. Observers subscribe to [`SessionSnapshot`]s through a
//! `tokio::sync::watch` channel; every identity change bumps `epoch`.
//!
//! Requests are authorized explicitly: callers take [`SessionStore::token`]
//! and hand it to the API client, which builds headers per request.

mod token;

use std::collections::BTreeSet;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::instrument;

use shopfront_core::{Email, Role};

use crate::api::{ApiClient, LoginRequest, LoginResponse, RegisterRequest};
use crate::error::StoreError;
use crate::notify::{Notification, Notifier};
use crate::persist::TokenStore;

pub use token::{TokenDecodeError, TokenIdentity, decode_identity};

/// The authenticated user.
#[derive(Clone)]
pub struct Identity {
    pub token: SecretString,
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Identity {
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    fn from_login(response: LoginResponse) -> Self {
        Self {
            token: SecretString::from(response.token),
            username: response.username,
            roles: response.authorities.iter().map(|a| a.role()).collect(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Observable state of the session store.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// `None` while anonymous.
    pub identity: Option<Identity>,
    /// A login request is in flight.
    pub loading: bool,
    /// Incremented on every identity change (login, logout, restore).
    pub epoch: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// What a view requires before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Admin,
}

/// Outcome of checking an [`Access`] requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Anonymous; send the user to the login page.
    NeedsLogin,
    /// Signed in without the required role.
    Forbidden,
}

/// Fields of the registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegistrationForm {
    /// Check the form locally and build the request body.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` describing the first problem found.
    pub fn validate(&self) -> Result<RegisterRequest, StoreError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(StoreError::validation("Username is required"));
        }
        if self.password.is_empty() {
            return Err(StoreError::validation("Password is required"));
        }
        if self.password != self.confirm_password {
            return Err(StoreError::validation("Passwords do not match"));
        }
        let email = Email::parse(&self.email)
            .map_err(|e| StoreError::validation(format!("Invalid email: {e}")))?;

        Ok(RegisterRequest {
            username: username.to_string(),
            email,
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }
}

/// Single source of truth for the current user.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionStore {
    /// Create the store and restore any persisted session.
    ///
    /// A persisted token is decoded to rebuild the identity. Tokens that
    /// cannot be decoded or have expired are erased, leaving the session
    /// anonymous.
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let store = Self {
            inner: Arc::new(SessionInner {
                api,
                tokens,
                notifier,
                state,
            }),
        };
        store.restore();
        store
    }

    fn restore(&self) {
        let token = match self.inner.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted token");
                return;
            }
        };

        match decode_identity(token.expose_secret()) {
            Ok(restored) => {
                tracing::info!(username = %restored.username, "Restored persisted session");
                self.set_identity(Some(Identity {
                    token,
                    username: restored.username,
                    roles: restored.roles,
                }));
            }
            Err(e) => {
                tracing::info!(reason = %e, "Discarding persisted token");
                if let Err(e) = self.inner.tokens.clear() {
                    tracing::warn!(error = %e, "Could not erase persisted token");
                }
            }
        }
    }

    fn set_identity(&self, identity: Option<Identity>) {
        self.inner.state.send_modify(|state| {
            state.identity = identity;
            state.epoch += 1;
        });
    }

    fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every future state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    /// Bearer token to authorize requests with, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .state
            .borrow()
            .identity
            .as_ref()
            .map(|identity| identity.token.clone())
    }

    /// Number of identity changes so far.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.state.borrow().epoch
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().identity.is_some()
    }

    /// Whether the signed-in user holds the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .state
            .borrow()
            .identity
            .as_ref()
            .is_some_and(|identity| identity.has_role(&Role::Admin))
    }

    /// Check a view's access requirement against the current identity.
    #[must_use]
    pub fn require(&self, access: Access) -> AccessDecision {
        let state = self.inner.state.borrow();
        match (&state.identity, access) {
            (None, _) => AccessDecision::NeedsLogin,
            (Some(_), Access::Authenticated) => AccessDecision::Granted,
            (Some(identity), Access::Admin) if identity.has_role(&Role::Admin) => {
                AccessDecision::Granted
            }
            (Some(_), Access::Admin) => AccessDecision::Forbidden,
        }
    }

    /// Sign in. On failure any prior identity is left untouched.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> bool {
        match self.try_login(username, password).await {
            Ok(identity) => {
                tracing::info!(username = %identity.username, roles = ?identity.roles, "Logged in");
                self.notify(Notification::success("Login successful!"));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.notify(Notification::error(
                    "Login failed. Please check your credentials.",
                ));
                false
            }
        }
    }

    async fn try_login(&self, username: &str, password: &str) -> Result<Identity, StoreError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::validation("Username and password are required"));
        }

        self.inner.state.send_modify(|state| state.loading = true);
        let result = self
            .inner
            .api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;
        self.inner.state.send_modify(|state| state.loading = false);

        let identity = Identity::from_login(result?);
        if let Err(e) = self.inner.tokens.save(&identity.token) {
            // The session still works for this run.
            tracing::warn!(error = %e, "Could not persist token");
        }
        self.set_identity(Some(identity.clone()));
        Ok(identity)
    }

    /// Create an account. Does not sign in; the caller logs in separately.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> bool {
        let result = match form.validate() {
            Ok(request) => self.inner.api.register(&request).await.map_err(StoreError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.notify(Notification::success(
                    "Registration successful! Please login.",
                ));
                true
            }
            Err(StoreError::Validation(message)) => {
                self.notify(Notification::error(message));
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                self.notify(Notification::error("Registration failed. Please try again."));
                false
            }
        }
    }

    /// Sign out: forget the identity and erase the persisted token.
    ///
    /// Calling this while anonymous does nothing.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        if !self.is_authenticated() {
            tracing::debug!("Logout requested without an active session");
            return;
        }

        if let Err(e) = self.inner.tokens.clear() {
            tracing::warn!(error = %e, "Could not erase persisted token");
        }
        self.set_identity(None);
        tracing::info!("Logged out");
        self.notify(Notification::success("Logged out successfully!"));
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::config::ClientConfig;
    use crate::notify::RecordingNotifier;
    use crate::persist::MemoryTokenStore;

    fn offline_api() -> ApiClient {
        // Port 9 (discard) is never contacted by these tests.
        let config = ClientConfig::for_api(
            "http://127.0.0.1:9".parse().unwrap(),
            PathBuf::from("/nonexistent/token.json"),
        );
        ApiClient::new(&config).unwrap()
    }

    fn jwt(claims: &serde_json::Value) -> String {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(b"secret")).unwrap()
    }

    fn store_with(tokens: MemoryTokenStore) -> (SessionStore, Arc<MemoryTokenStore>, RecordingNotifier) {
        let tokens = Arc::new(tokens);
        let notifier = RecordingNotifier::new();
        let store = SessionStore::new(offline_api(), tokens.clone(), Arc::new(notifier.clone()));
        (store, tokens, notifier)
    }

    #[test]
    fn test_starts_anonymous_without_token() {
        let (store, _, _) = store_with(MemoryTokenStore::new());
        assert!(!store.is_authenticated());
        assert!(!store.is_admin());
        assert!(store.token().is_none());
        assert_eq!(store.snapshot().epoch, 0);
        assert_eq!(store.require(Access::Authenticated), AccessDecision::NeedsLogin);
    }

    #[test]
    fn test_restores_identity_from_token() {
        let token = jwt(&serde_json::json!({
            "sub": "alice",
            "authorities": [{"authority": "ROLE_ADMIN"}]
        }));
        let (store, _, _) = store_with(MemoryTokenStore::with_token(token.clone()));

        let identity = store.identity().unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.token.expose_secret(), token);
        assert!(store.is_admin());
        assert_eq!(store.snapshot().epoch, 1);
        assert_eq!(store.require(Access::Admin), AccessDecision::Granted);
    }

    #[test]
    fn test_undecodable_token_is_erased() {
        let (store, tokens, _) = store_with(MemoryTokenStore::with_token("opaque"));
        assert!(!store.is_authenticated());
        assert!(tokens.load().unwrap().is_none());
    }

    #[test]
    fn test_customer_is_forbidden_from_admin() {
        let token = jwt(&serde_json::json!({"sub": "bob", "roles": ["ROLE_USER"]}));
        let (store, _, _) = store_with(MemoryTokenStore::with_token(token));
        assert!(!store.is_admin());
        assert_eq!(store.require(Access::Authenticated), AccessDecision::Granted);
        assert_eq!(store.require(Access::Admin), AccessDecision::Forbidden);
    }

    #[test]
    fn test_logout_clears_everything() {
        let token = jwt(&serde_json::json!({"sub": "alice"}));
        let (store, tokens, notifier) = store_with(MemoryTokenStore::with_token(token));

        store.logout();

        assert!(store.identity().is_none());
        assert!(store.token().is_none());
        assert!(tokens.load().unwrap().is_none());
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Logged out successfully!"))
        );
    }

    #[test]
    fn test_logout_when_anonymous_is_noop() {
        let (store, _, notifier) = store_with(MemoryTokenStore::new());
        store.logout();
        store.logout();
        assert_eq!(store.snapshot().epoch, 0);
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_login_validation_skips_network() {
        let (store, _, notifier) = store_with(MemoryTokenStore::new());
        assert!(!store.login("  ", "pw").await);
        assert!(!store.is_authenticated());
        assert_eq!(
            notifier.last(),
            Some(Notification::error(
                "Login failed. Please check your credentials."
            ))
        );
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let (store, _, notifier) = store_with(MemoryTokenStore::new());
        let form = RegistrationForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "one".to_string(),
            confirm_password: "two".to_string(),
            ..RegistrationForm::default()
        };
        assert!(!store.register(&form).await);
        assert_eq!(
            notifier.last(),
            Some(Notification::error("Passwords do not match"))
        );
    }

    #[test]
    fn test_registration_form_validation() {
        let mut form = RegistrationForm {
            username: " alice ".to_string(),
            email: "alice@example.com".to_string(),
            password: "pw".to_string(),
            confirm_password: "pw".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
        };
        let request = form.validate().unwrap();
        assert_eq!(request.username, "alice");

        form.email = "not-an-email".to_string();
        assert!(matches!(form.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity = Identity {
            token: SecretString::from("super-secret-token"),
            username: "alice".to_string(),
            roles: BTreeSet::new(),
        };
        let debug = format!("{identity:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }
}
