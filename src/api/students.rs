use crate::api::client::ApiClient;
use crate::core::error::ApiError;
use crate::models::student::{Student, StudentDraft};
use reqwest::Method;
use tracing::debug;

const STUDENTS_PATH: &str = "/students";

/// CRUD client for the student collection.
///
/// No client-side validation happens here; the backend is the authority for
/// both record shape and permissions.
#[derive(Clone)]
pub struct StudentClient {
    api: ApiClient,
}

impl StudentClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// GET /students
    pub async fn list(&self) -> Result<Vec<Student>, ApiError> {
        self.api
            .send_envelope(self.api.request(Method::GET, STUDENTS_PATH))
            .await
    }

    /// GET /students/{id}
    pub async fn get(&self, id: i64) -> Result<Student, ApiError> {
        self.api
            .send_envelope(self.api.request(Method::GET, &item_path(id)))
            .await
    }

    /// GET /students/search?name=...
    ///
    /// Matching rules belong to the backend.
    pub async fn search(&self, name: &str) -> Result<Vec<Student>, ApiError> {
        let builder = self
            .api
            .request(Method::GET, &format!("{}/search", STUDENTS_PATH))
            .query(&[("name", name)]);

        self.api.send_envelope(builder).await
    }

    /// POST /students
    pub async fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        debug!(name = %draft.name, "Creating student");

        let builder = self.api.request(Method::POST, STUDENTS_PATH).json(draft);
        self.api.send_envelope(builder).await
    }

    /// PUT /students/{id}
    pub async fn update(&self, id: i64, draft: &StudentDraft) -> Result<Student, ApiError> {
        debug!(id, name = %draft.name, "Updating student");

        let builder = self.api.request(Method::PUT, &item_path(id)).json(draft);
        self.api.send_envelope(builder).await
    }

    /// DELETE /students/{id}
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        debug!(id, "Deleting student");

        self.api
            .send_envelope_unit(self.api.request(Method::DELETE, &item_path(id)))
            .await
    }
}

fn item_path(id: i64) -> String {
    format!("{}/{}", STUDENTS_PATH, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::AppState;
    use crate::models::auth::LoginRequest;
    use crate::stores::session_store::{TOKEN_KEY, USER_KEY};
    use crate::test_support::MockBackend;

    async fn logged_in(backend: &MockBackend, user: &str) -> AppState {
        let state = AppState::for_tests(&backend.base_url);
        state
            .session
            .login(&state.auth, &LoginRequest::new(user, user))
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let backend = MockBackend::start().await;
        let state = AppState::for_tests(&backend.base_url);

        let students = state.students.list().await.unwrap();
        assert_eq!(students.len(), 2);

        let id = students[0].id.unwrap();
        let student = state.students.get(id).await.unwrap();
        assert_eq!(student, students[0]);
    }

    #[tokio::test]
    async fn test_search_passes_name_to_backend() {
        let backend = MockBackend::start().await;
        let state = AppState::for_tests(&backend.base_url);

        let found = state.students.search("Ada Love").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ada Lovelace");

        assert!(state.students.search("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_sends_bearer() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "user").await;

        let created = state
            .students
            .create(&StudentDraft::new("Jo March", "jo@example.com").with_phone("555-0100"))
            .await
            .unwrap();

        assert!(created.id.is_some());
        assert_eq!(created.phone.as_deref(), Some("555-0100"));
        assert_eq!(
            backend.last_authorization().as_deref(),
            Some("Bearer token-user")
        );
    }

    #[tokio::test]
    async fn test_create_validation_carries_backend_message() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "user").await;

        let err = state
            .students
            .create(&StudentDraft::new("Jo", "bad-email"))
            .await
            .unwrap_err();

        assert_eq!(err.server_message(), Some("Validation failed"));
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("email"));
        assert!(state.session.logged_in());
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "user").await;
        let before = state.students.list().await.unwrap().remove(0);
        let id = before.id.unwrap();

        let mut draft = before.to_draft();
        draft.name = "Renamed Student".to_string();
        let updated = state.students.update(id, &draft).await.unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.name, "Renamed Student");
        assert_eq!(state.students.get(id).await.unwrap().name, "Renamed Student");
    }

    #[tokio::test]
    async fn test_delete_as_admin() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "admin").await;
        let id = state.students.list().await.unwrap()[0].id.unwrap();

        state.students.delete(id).await.unwrap();

        let err = state.students.get(id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_as_user_is_forbidden_without_logout() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "user").await;
        let id = state.students.list().await.unwrap()[0].id.unwrap();

        let err = state.students.delete(id).await.unwrap_err();

        assert!(matches!(err, ApiError::Forbidden { .. }));
        assert!(state.session.logged_in());
    }

    #[tokio::test]
    async fn test_expired_token_logs_out_and_error_reaches_caller() {
        let backend = MockBackend::start().await;
        let state = logged_in(&backend, "user").await;
        state.navigator.navigate("/students/new");
        backend.expire_token("token-user");

        let err = state
            .students
            .create(&StudentDraft::new("Jo March", "jo@example.com"))
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!state.session.logged_in());
        assert!(state.storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(state.storage.get(USER_KEY).unwrap().is_none());

        let location = state.navigator.current();
        assert_eq!(location.path, "/login");
        assert_eq!(location.return_url(), Some("/students/new"));
    }

    #[tokio::test]
    async fn test_anonymous_reads_send_no_credentials() {
        let backend = MockBackend::start().await;
        let state = AppState::for_tests(&backend.base_url);

        state.students.list().await.unwrap();
        assert_eq!(backend.last_authorization(), None);
    }
}
