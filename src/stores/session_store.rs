use crate::core::error::ApiError;
use crate::models::auth::{Identity, LoginRequest, LoginResponse, StoredUser};
use crate::stores::storage::Storage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Storage key for the raw bearer token
pub const TOKEN_KEY: &str = "edu_token";
/// Storage key for the serialized user record
pub const USER_KEY: &str = "edu_user";

/// Performs the credential exchange for [`SessionStore::login`]
pub trait Authenticator {
    fn authenticate(
        &self,
        credentials: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;
}

/// Owner of the current identity.
///
/// Durable storage is the source of truth: it is written before the
/// in-memory identity is published, and rehydrated on construction.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    identity: watch::Sender<Option<Arc<Identity>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let identity = Self::rehydrate(storage.as_ref()).map(Arc::new);

        if let Some(identity) = &identity {
            info!(username = %identity.username, "Session restored from storage");
        }

        let (identity, _) = watch::channel(identity);

        Self { storage, identity }
    }

    /// Read both mirrored keys; anything missing or unreadable means no identity
    pub fn rehydrate(storage: &dyn Storage) -> Option<Identity> {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read session token, starting logged out");
                return None;
            }
        };

        let user = match storage.get(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to read session user, starting logged out");
                return None;
            }
        };

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => (token, user),
            _ => return None,
        };

        match serde_json::from_str::<StoredUser>(&user) {
            Ok(user) => Some(user.into_identity(token)),
            Err(e) => {
                warn!(error = %e, "Stored session user is not valid JSON, starting logged out");
                None
            }
        }
    }

    pub fn current(&self) -> Option<Arc<Identity>> {
        self.identity.borrow().clone()
    }

    pub fn logged_in(&self) -> bool {
        self.identity.borrow().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.identity
            .borrow()
            .as_ref()
            .is_some_and(|identity| identity.is_admin())
    }

    /// Empty when logged out
    pub fn username(&self) -> String {
        self.identity
            .borrow()
            .as_ref()
            .map(|identity| identity.username.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.identity
            .borrow()
            .as_ref()
            .is_some_and(|identity| identity.has_role(role))
    }

    pub fn token(&self) -> Option<String> {
        self.identity
            .borrow()
            .as_ref()
            .map(|identity| identity.token.clone())
    }

    /// Receiver notified on every identity change
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Identity>>> {
        self.identity.subscribe()
    }

    pub async fn login<A>(
        &self,
        authenticator: &A,
        credentials: &LoginRequest,
    ) -> Result<Arc<Identity>, ApiError>
    where
        A: Authenticator,
    {
        let response = match authenticator.authenticate(credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(username = %credentials.username, error = %e, "Login failed");
                return Err(e);
            }
        };

        self.establish(response)
    }

    /// Persist a successful login, then publish it
    pub fn establish(&self, response: LoginResponse) -> Result<Arc<Identity>, ApiError> {
        let identity = Identity::from(response);
        let user = serde_json::to_string(&StoredUser::from_identity(&identity))?;

        self.storage
            .set_many(&[(TOKEN_KEY, identity.token.as_str()), (USER_KEY, user.as_str())])?;

        let identity = Arc::new(identity);
        self.identity.send_replace(Some(Arc::clone(&identity)));

        info!(
            username = %identity.username,
            roles = ?identity.roles,
            admin = identity.is_admin(),
            "Logged in"
        );

        Ok(identity)
    }

    /// Clear storage and memory. Returns whether a session was torn down;
    /// repeated calls are no-ops and do not notify subscribers.
    pub fn logout(&self) -> bool {
        if let Err(e) = self.storage.remove_many(&[TOKEN_KEY, USER_KEY]) {
            warn!(error = %e, "Failed to clear stored session");
        }

        let torn_down = self.identity.send_if_modified(|identity| identity.take().is_some());

        if torn_down {
            info!("Logged out");
        }

        torn_down
    }
}
