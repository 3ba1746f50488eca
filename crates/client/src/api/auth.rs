//! Authentication endpoints.

use tracing::instrument;

use super::{ApiClient, ApiError, LoginRequest, LoginResponse, RegisterRequest};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, or any
    /// transport/parse error.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json("/api/auth/login", request, None).await
    }

    /// Create a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the profile or the request fails.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.post_unit("/api/auth/register", request, None).await
    }
}
