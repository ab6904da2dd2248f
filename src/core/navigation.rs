use crate::core::routes::{self, Route, RouteMatch, LOGIN_PATH};
use crate::stores::session_store::SessionStore;
use crate::security::guards::GuardDecision;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Query parameter carrying the page to resume after login
pub const RETURN_URL_PARAM: &str = "returnUrl";

const MAX_REDIRECTS: usize = 8;

/// Path plus ordered query pairs, e.g. `/login?returnUrl=%2Fstudents%2Fnew`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn parse(url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        let query = if query.is_empty() {
            Vec::new()
        } else {
            serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_default()
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Self { path, query }
    }

    /// Login page carrying `attempted` as the return target
    pub fn login_with_return(attempted: &Location) -> Self {
        Self {
            path: LOGIN_PATH.to_string(),
            query: vec![(RETURN_URL_PARAM.to_string(), attempted.to_string())],
        }
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn return_url(&self) -> Option<&str> {
        self.query_param(RETURN_URL_PARAM)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;

        if !self.query.is_empty() {
            if let Ok(query) = serde_urlencoded::to_string(&self.query) {
                write!(f, "?{}", query)?;
            }
        }

        Ok(())
    }
}

/// Tracks the current location and applies the route table and its guards
pub struct Navigator {
    session: Arc<SessionStore>,
    location: watch::Sender<Location>,
}

impl Navigator {
    pub fn new(session: Arc<SessionStore>) -> Self {
        let (location, _) = watch::channel(Location::new(routes::STUDENTS_PATH));
        Self { session, location }
    }

    pub fn current(&self) -> Location {
        self.location.borrow().clone()
    }

    pub fn current_route(&self) -> Option<Route> {
        match routes::resolve(&self.location.borrow().path) {
            RouteMatch::Page(route) => Some(route),
            RouteMatch::Redirect(_) => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.location.subscribe()
    }

    /// Navigate to `target`, following route redirects and guard decisions.
    /// Returns the location actually reached.
    pub fn navigate(&self, target: &str) -> Location {
        let mut location = Location::parse(target);

        for _ in 0..MAX_REDIRECTS {
            match routes::resolve(&location.path) {
                RouteMatch::Redirect(path) => {
                    debug!(from = %location, to = path, "Route redirect");
                    location = Location::new(path);
                }
                RouteMatch::Page(route) => {
                    let decision = match route.guard() {
                        Some(guard) => guard.check(&self.session, &location),
                        None => GuardDecision::Allow,
                    };

                    match decision {
                        GuardDecision::Allow => return self.publish(location),
                        GuardDecision::Redirect(next) => {
                            debug!(denied = %location, to = %next, "Guard redirect");
                            location = next;
                        }
                    }
                }
            }
        }

        warn!(requested = target, "Too many redirects, staying on the student list");
        self.publish(Location::new(routes::STUDENTS_PATH))
    }

    /// Send the user to login, remembering where they were.
    /// Already being on the login page leaves the location untouched.
    pub fn redirect_to_login(&self) -> Location {
        let current = self.current();

        if self.current_route() == Some(Route::Login) {
            return current;
        }

        self.publish(Location::login_with_return(&current))
    }

    fn publish(&self, location: Location) -> Location {
        self.location.send_replace(location.clone());
        location
    }
}
