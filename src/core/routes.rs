// Client route table

use crate::security::guards::Guard;

pub const LOGIN_PATH: &str = "/login";
pub const STUDENTS_PATH: &str = "/students";
pub const STUDENT_NEW_PATH: &str = "/students/new";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Students,
    StudentNew,
    StudentEdit(i64),
}

/// Outcome of matching a path against the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Page(Route),
    Redirect(&'static str),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => LOGIN_PATH.to_string(),
            Route::Students => STUDENTS_PATH.to_string(),
            Route::StudentNew => STUDENT_NEW_PATH.to_string(),
            Route::StudentEdit(id) => format!("/students/edit/{}", id),
        }
    }

    /// Guard consulted before entering the route
    pub fn guard(&self) -> Option<Guard> {
        match self {
            Route::StudentNew | Route::StudentEdit(_) => Some(Guard::Authenticated),
            Route::Login | Route::Students => None,
        }
    }
}

pub fn resolve(path: &str) -> RouteMatch {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();

    match segments.as_slice() {
        [""] => RouteMatch::Redirect(STUDENTS_PATH),
        ["login"] => RouteMatch::Page(Route::Login),
        ["students"] => RouteMatch::Page(Route::Students),
        ["students", "new"] => RouteMatch::Page(Route::StudentNew),
        ["students", "edit", id] => match id.parse::<i64>() {
            Ok(id) => RouteMatch::Page(Route::StudentEdit(id)),
            Err(_) => RouteMatch::Redirect(STUDENTS_PATH),
        },
        // Wildcard
        _ => RouteMatch::Redirect(STUDENTS_PATH),
    }
}
