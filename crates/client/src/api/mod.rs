//! Storefront backend REST client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`
//! - The backend is the source of truth for products, carts and orders
//! - Requests carry no ambient credentials: every authenticated call takes the
//!   bearer token explicitly and builds its headers with [`authorization_headers`]
//!
//! Endpoints are grouped by resource:
//! - `auth` - login and registration
//! - `products` - catalog reads
//! - `cart` - the caller's cart
//! - `orders` - checkout and order history
//! - `admin` - role-gated administration

mod admin;
mod auth;
mod cart;
mod orders;
mod products;
pub mod types;

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ClientConfig;

pub use types::*;

/// How much of an error body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 200;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, TLS, ...
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials (401/403).
    #[error("Unauthorized ({0})")]
    Unauthorized(StatusCode),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Status { status: StatusCode, message: String },

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A token contained characters that cannot appear in a header.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

/// Headers authorizing a request on behalf of `token`.
///
/// Returns an empty map for anonymous requests.
///
/// # Errors
///
/// Returns `ApiError::InvalidHeader` if the token is not a valid header value.
pub fn authorization_headers(token: Option<&SecretString>) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Client for the storefront REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and map non-success statuses to `ApiError`.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.headers(authorization_headers(token)?).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = body.chars().take(ERROR_BODY_LIMIT).collect::<String>();
        tracing::debug!(%status, path, body = %message, "Backend returned non-success status");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(status),
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            _ => ApiError::Status { status, message },
        })
    }

    /// Decode a JSON body, logging a snippet of anything unparseable.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let request = self.inner.client.get(self.url(path));
        let response = self.send(request, path, token).await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let request = self.inner.client.post(self.url(path)).json(body);
        let response = self.send(request, path, token).await?;
        Self::decode(response).await
    }

    /// POST whose response body is irrelevant.
    async fn post_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let request = self.inner.client.post(self.url(path)).json(body);
        self.send(request, path, token).await.map(drop)
    }

    async fn put_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let mut request = self.inner.client.put(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, path, token).await.map(drop)
    }

    async fn delete_unit(&self, path: &str, token: Option<&SecretString>) -> Result<(), ApiError> {
        let request = self.inner.client.delete(self.url(path));
        self.send(request, path, token).await.map(drop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_authorization_headers_anonymous() {
        let headers = authorization_headers(None).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_authorization_headers_bearer() {
        let token = SecretString::from("abc.def.ghi");
        let headers = authorization_headers(Some(&token)).unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc.def.ghi");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_authorization_headers_rejects_newlines() {
        let token = SecretString::from("abc\ndef");
        assert!(matches!(
            authorization_headers(Some(&token)),
            Err(ApiError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::for_api(
            "http://localhost:8080/".parse().unwrap(),
            PathBuf::from("/tmp/token.json"),
        );
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/api/cart"), "http://localhost:8080/api/cart");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: "Username taken".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 409 Conflict - Username taken");
        assert_eq!(
            ApiError::NotFound("/api/products/9".to_string()).to_string(),
            "Not found: /api/products/9"
        );
    }
}
