use crate::stores::session_store::SessionStore;
use std::fmt;

/// What the navigation bar shows for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavbarSummary {
    LoggedIn { username: String, admin: bool },
    LoggedOut,
}

pub fn summary(session: &SessionStore) -> NavbarSummary {
    match session.current() {
        Some(identity) => NavbarSummary::LoggedIn {
            username: identity.username.clone(),
            admin: identity.is_admin(),
        },
        None => NavbarSummary::LoggedOut,
    }
}

impl fmt::Display for NavbarSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavbarSummary::LoggedIn { username, admin: true } => write!(f, "{} [admin]", username),
            NavbarSummary::LoggedIn { username, .. } => f.write_str(username),
            NavbarSummary::LoggedOut => f.write_str("Not logged in. Run `edumanager login <username> <password>`"),
        }
    }
}
