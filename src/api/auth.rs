use crate::api::client::ApiClient;
use crate::core::error::ApiError;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::stores::session_store::Authenticator;
use reqwest::Method;
use std::future::Future;
use tracing::debug;

const LOGIN_PATH: &str = "/auth/login";

/// Client for the authentication endpoint
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// POST /auth/login
    ///
    /// Bad credentials come back as [`ApiError::Unauthorized`]; every other
    /// non-2xx keeps its status in [`ApiError::status`].
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        debug!(username = %credentials.username, "Sending login request");

        let builder = self.api.request(Method::POST, LOGIN_PATH).json(credentials);
        self.api.send_json(builder).await
    }
}

impl Authenticator for AuthClient {
    fn authenticate(
        &self,
        credentials: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send {
        self.login(credentials)
    }
}
