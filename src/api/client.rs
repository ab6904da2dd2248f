use crate::api::interceptor::{CredentialLayer, CredentialService};
use crate::core::config::ApiConfig;
use crate::core::error::ApiError;
use crate::core::navigation::Navigator;
use crate::models::envelope::ApiResponse;
use crate::stores::session_store::SessionStore;
use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};

/// HTTP client for the backend API.
///
/// Requests are built with a plain `reqwest::Client` and sent through the
/// credential middleware, so every call made through this type is
/// authenticated the same way.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    service: CredentialService<reqwest::Client>,
    base_url: Arc<str>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionStore>,
        navigator: Arc<Navigator>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let http = builder.build().context("Failed to create HTTP client")?;

        let service = ServiceBuilder::new()
            .layer(CredentialLayer::new(session, navigator))
            .service(http.clone());

        Ok(Self {
            http,
            service,
            base_url: config.base_url.trim_end_matches('/').into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send through the credential middleware. Any HTTP status is `Ok` here.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = builder.build()?;
        let response = self.service.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Send and decode a JSON body; non-2xx statuses become [`ApiError`]s
    pub async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(builder).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Send and unwrap the response envelope's `data`
    pub async fn send_envelope<T>(&self, builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.send_json::<ApiResponse<T>>(builder).await?.into_data()
    }

    /// Send, check the envelope, discard its `data`
    pub async fn send_envelope_unit(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send_json::<ApiResponse<serde_json::Value>>(builder)
            .await?
            .into_unit()
    }
}
