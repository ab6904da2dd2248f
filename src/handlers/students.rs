use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::student::Student;
use tracing::{debug, warn};

pub const LOAD_FAILED: &str = "Failed to load students";
pub const DELETED: &str = "Student deleted successfully";
pub const DELETE_FAILED: &str = "Failed to delete student";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    fn success(message: &str) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.to_string(),
        }
    }
}

/// Student list page
///
/// /students
pub struct StudentsView {
    state: AppState,
    pub students: Vec<Student>,
    pub error: Option<String>,
    pub toast: Option<Toast>,
    pending_delete: Option<i64>,
}

impl StudentsView {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            students: Vec::new(),
            error: None,
            toast: None,
            pending_delete: None,
        }
    }

    pub async fn load(&mut self) {
        self.error = None;

        match self.state.students.list().await {
            Ok(students) => {
                debug!(count = students.len(), "Students loaded");
                self.students = students;
            }
            Err(e) => self.fail_load(&e),
        }
    }

    /// Backend search by name; a blank name reloads the full list
    pub async fn search(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return self.load().await;
        }

        self.error = None;

        match self.state.students.search(name).await {
            Ok(students) => self.students = students,
            Err(e) => self.fail_load(&e),
        }
    }

    fn fail_load(&mut self, error: &ApiError) {
        warn!(error = %error, "Failed to load students");
        self.error = Some(error.server_message().unwrap_or(LOAD_FAILED).to_string());
    }

    /// Rows whose name or email contains `term`, ignoring case
    pub fn filtered(&self, term: &str) -> Vec<&Student> {
        self.students.iter().filter(|s| s.matches(term)).collect()
    }

    pub fn can_create(&self) -> bool {
        self.state.session.logged_in()
    }

    pub fn can_delete(&self) -> bool {
        self.state.session.is_admin()
    }

    /// Ask for confirmation before deleting. Ignored for non-admins and
    /// records without an id.
    pub fn confirm_delete(&mut self, student: &Student) -> bool {
        match student.id {
            Some(id) if self.can_delete() => {
                self.pending_delete = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.pending_delete
    }

    /// Delete the confirmed record; the outcome lands in `toast`
    pub async fn delete_confirmed(&mut self) -> bool {
        let Some(id) = self.pending_delete else {
            return false;
        };

        match self.state.students.delete(id).await {
            Ok(()) => {
                self.students.retain(|s| s.id != Some(id));
                self.pending_delete = None;
                self.toast = Some(Toast::success(DELETED));
                true
            }
            Err(e) => {
                warn!(id, error = %e, "Delete failed");
                self.toast = Some(Toast::error(e.server_message().unwrap_or(DELETE_FAILED)));
                false
            }
        }
    }
}
