use crate::core::navigation::Location;
use crate::core::routes::STUDENTS_PATH;
use crate::stores::session_store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Location),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

impl Guard {
    pub fn check(self, session: &SessionStore, attempted: &Location) -> GuardDecision {
        match self {
            Guard::Authenticated => authenticated(session, attempted),
            Guard::Admin => admin(session, attempted),
        }
    }
}

/// Allow when logged in; otherwise send to login with the attempted location
pub fn authenticated(session: &SessionStore, attempted: &Location) -> GuardDecision {
    if session.logged_in() {
        return GuardDecision::Allow;
    }

    GuardDecision::Redirect(Location::login_with_return(attempted))
}

/// Allow admins only.
///
/// Logged-out callers go to login (with return target); logged-in
/// non-admins go to the student list instead.
pub fn admin(session: &SessionStore, attempted: &Location) -> GuardDecision {
    if !session.logged_in() {
        return GuardDecision::Redirect(Location::login_with_return(attempted));
    }

    if session.is_admin() {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(Location::new(STUDENTS_PATH))
    }
}
