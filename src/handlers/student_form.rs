use crate::core::error::ApiError;
use crate::core::navigation::Location;
use crate::core::routes::{Route, STUDENTS_PATH};
use crate::core::state::AppState;
use crate::models::student::StudentDraft;
use tracing::warn;

pub const LOAD_FAILED: &str = "Failed to load student data";
pub const REQUIRED_FIELDS: &str = "Please fill in all required fields";
pub const SAVE_FAILED: &str = "Failed to save student";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

/// Create and edit page
///
/// /students/new, /students/edit/{id}
pub struct StudentFormView {
    state: AppState,
    mode: FormMode,
    pub draft: StudentDraft,
    pub error: Option<String>,
    pub saving: bool,
}

impl StudentFormView {
    /// Mode comes from the current route
    pub fn open(state: AppState) -> Self {
        let mode = match state.navigator.current_route() {
            Some(Route::StudentEdit(id)) => FormMode::Edit(id),
            _ => FormMode::Create,
        };

        Self {
            state,
            mode,
            draft: StudentDraft::default(),
            error: None,
            saving: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Fill the form from the stored record in edit mode
    pub async fn load(&mut self) -> bool {
        let FormMode::Edit(id) = self.mode else {
            return true;
        };

        match self.state.students.get(id).await {
            Ok(student) => {
                self.draft = student.to_draft();
                true
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to load student");
                self.error = Some(LOAD_FAILED.to_string());
                false
            }
        }
    }

    /// Save and return to the list; failures are kept in `error`
    pub async fn submit(&mut self) -> Option<Location> {
        if !self.draft.has_required_fields() {
            self.error = Some(REQUIRED_FIELDS.to_string());
            return None;
        }

        self.saving = true;
        self.error = None;

        let result = match self.mode {
            FormMode::Edit(id) => self.state.students.update(id, &self.draft).await,
            FormMode::Create => self.state.students.create(&self.draft).await,
        };

        match result {
            Ok(_) => Some(self.state.navigator.navigate(STUDENTS_PATH)),
            Err(e) => {
                self.saving = false;
                warn!(error = %e, "Failed to save student");
                self.error = Some(save_error_message(&e));
                None
            }
        }
    }
}

/// Backend message with any field messages appended, else the `email` field
/// message, else a generic failure
pub fn save_error_message(error: &ApiError) -> String {
    let fields = error.field_errors().filter(|f| !f.is_empty());

    match (error.server_message(), fields) {
        (Some(message), Some(fields)) if !message.is_empty() => {
            let details: Vec<String> = fields
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect();
            format!("{} ({})", message, details.join("; "))
        }
        (Some(message), _) if !message.is_empty() => message.to_string(),
        (_, Some(fields)) => fields
            .get("email")
            .cloned()
            .unwrap_or_else(|| SAVE_FAILED.to_string()),
        _ => SAVE_FAILED.to_string(),
    }
}
