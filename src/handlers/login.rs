use crate::core::error::ApiError;
use crate::core::navigation::Location;
use crate::core::routes::STUDENTS_PATH;
use crate::core::state::AppState;
use tracing::debug;

pub const MISSING_CREDENTIALS: &str = "Please enter username and password";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Login page
///
/// /login?returnUrl=...
pub struct LoginView {
    state: AppState,
    return_url: String,
    pub error: Option<String>,
    pub loading: bool,
    /// Set when the page was opened with a session already in place
    pub redirected: Option<Location>,
}

impl LoginView {
    pub fn open(state: AppState) -> Self {
        let return_url = state
            .navigator
            .current()
            .return_url()
            .filter(|url| !url.is_empty())
            .unwrap_or(STUDENTS_PATH)
            .to_string();

        let redirected = if state.session.logged_in() {
            debug!(to = %return_url, "Already logged in, leaving login page");
            Some(state.navigator.navigate(&return_url))
        } else {
            None
        };

        Self {
            state,
            return_url,
            error: None,
            loading: false,
            redirected,
        }
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    /// Returns the location reached on success; failures are kept in `error`
    pub async fn submit(&mut self, username: &str, password: &str) -> Option<Location> {
        if username.is_empty() || password.is_empty() {
            self.error = Some(MISSING_CREDENTIALS.to_string());
            return None;
        }

        self.loading = true;
        self.error = None;

        let result = self.state.login(username, password).await;
        self.loading = false;

        match result {
            Ok(_) => Some(self.state.navigator.navigate(&self.return_url)),
            Err(e) => {
                self.error = Some(login_error_message(&e).to_string());
                None
            }
        }
    }
}

fn login_error_message(error: &ApiError) -> &'static str {
    if error.status() == Some(401) {
        INVALID_CREDENTIALS
    } else {
        LOGIN_FAILED
    }
}
