// Credential attachment and authorization-failure handling for outgoing requests

use crate::core::navigation::Navigator;
use crate::stores::session_store::SessionStore;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Wraps a transport so every request carries the session's bearer token and
/// every `401 Unauthorized` tears the session down.
#[derive(Clone)]
pub struct CredentialLayer {
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
}

impl CredentialLayer {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl<S> Layer<S> for CredentialLayer {
    type Service = CredentialService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CredentialService {
            inner,
            session: Arc::clone(&self.session),
            navigator: Arc::clone(&self.navigator),
        }
    }
}

#[derive(Clone)]
pub struct CredentialService<S> {
    inner: S,
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
}

impl<S> Service<reqwest::Request> for CredentialService<S>
where
    S: Service<reqwest::Request, Response = reqwest::Response>,
    S::Future: Send + 'static,
    S::Error: 'static,
{
    type Response = reqwest::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: reqwest::Request) -> Self::Future {
        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "Session token is not a valid header value, sending without credentials");
                }
            }
        }

        let method = request.method().clone();
        let path = request.url().path().to_string();
        let future = self.inner.call(request);
        let session = Arc::clone(&self.session);
        let navigator = Arc::clone(&self.navigator);

        Box::pin(async move {
            let response = future.await?;

            debug!(method = %method, path = %path, status = response.status().as_u16(), "API response");

            if response.status() == StatusCode::UNAUTHORIZED {
                let torn_down = session.logout();
                let location = navigator.redirect_to_login();

                warn!(
                    method = %method,
                    path = %path,
                    session_cleared = torn_down,
                    redirect = %location,
                    "Request rejected as unauthorized"
                );
            }

            // The caller still receives the response and maps it to its own error
            Ok(response)
        })
    }
}
