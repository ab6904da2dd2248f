// Application state (AppState)

use crate::api::auth::AuthClient;
use crate::api::client::ApiClient;
use crate::api::students::StudentClient;
use crate::core::config::Config;
use crate::core::error::ApiError;
use crate::core::navigation::{Location, Navigator};
use crate::core::routes::LOGIN_PATH;
use crate::models::auth::{Identity, LoginRequest};
use crate::stores::session_store::SessionStore;
use crate::stores::storage::{FileStorage, Storage};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Shared application state
///
/// One session, one navigator and one credential-aware HTTP stack, shared by
/// every view. All fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Backing store for the persisted session keys
    pub storage: Arc<dyn Storage>,

    pub session: Arc<SessionStore>,

    pub navigator: Arc<Navigator>,

    pub auth: AuthClient,

    pub students: StudentClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage.path.clone()));
        Self::with_storage(config, storage)
    }

    /// Wire everything over an explicit storage backend.
    /// The session is rehydrated from `storage` before any request goes out.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let config = Arc::new(config);
        let session = Arc::new(SessionStore::new(Arc::clone(&storage)));
        let navigator = Arc::new(Navigator::new(Arc::clone(&session)));

        let api = ApiClient::new(&config.api, Arc::clone(&session), Arc::clone(&navigator))?;

        debug!(base_url = api.base_url(), logged_in = session.logged_in(), "Application state ready");

        Ok(Self {
            config,
            storage,
            session,
            navigator,
            auth: AuthClient::new(api.clone()),
            students: StudentClient::new(api),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Arc<Identity>, ApiError> {
        self.session
            .login(&self.auth, &LoginRequest::new(username, password))
            .await
    }

    /// End the session and land on the login page
    pub fn logout(&self) -> Location {
        self.session.logout();
        self.navigator.navigate(LOGIN_PATH)
    }

    #[cfg(test)]
    pub fn for_tests(base_url: &str) -> Self {
        use crate::stores::storage::MemoryStorage;

        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        config.api.timeout_secs = 5;
        config.api.use_system_proxy = false;

        Self::with_storage(config, Arc::new(MemoryStorage::new()))
            .expect("test state should build")
    }
}
