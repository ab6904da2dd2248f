// In-process stand-in for the student backend, used by async tests

use axum::extract::{Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::models::student::Student;

struct Account {
    password: &'static str,
    roles: &'static [&'static str],
}

#[derive(Default)]
struct Backend {
    students: Mutex<BTreeMap<i64, Student>>,
    next_id: Mutex<i64>,
    tokens: Mutex<HashMap<String, &'static [&'static str]>>,
    expired: Mutex<HashSet<String>>,
    last_authorization: Mutex<Option<String>>,
    fail_logins: AtomicBool,
    forced: Mutex<Option<(StatusCode, String)>>,
}

fn account(username: &str) -> Option<Account> {
    match username {
        "admin" => Some(Account {
            password: "admin",
            roles: &["ROLE_ADMIN", "ROLE_USER"],
        }),
        "user" => Some(Account {
            password: "user",
            roles: &["ROLE_USER"],
        }),
        _ => None,
    }
}

enum Caller {
    Anonymous,
    User(&'static [&'static str]),
}

impl Backend {
    fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut students = backend.students.lock().unwrap();
            for (id, name, email, phone) in [
                (1, "Ada Lovelace", "ada@example.com", Some("555-0101")),
                (2, "Alan Turing", "alan@example.com", None),
            ] {
                students.insert(
                    id,
                    Student {
                        id: Some(id),
                        name: name.to_string(),
                        email: email.to_string(),
                        phone: phone.map(str::to_string),
                    },
                );
            }
        }
        *backend.next_id.lock().unwrap() = 3;
        backend
    }

    /// Records the header; a forced failure wins, then a present but unknown
    /// or expired token is a 401
    fn caller(&self, headers: &HeaderMap) -> Result<Caller, Response> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_authorization.lock().unwrap() = header.clone();

        if let Some((status, body)) = self.forced.lock().unwrap().clone() {
            return Err((status, body).into_response());
        }

        let Some(header) = header else {
            return Ok(Caller::Anonymous);
        };

        let token = header.strip_prefix("Bearer ").unwrap_or_default();
        if self.expired.lock().unwrap().contains(token) {
            return Err(unauthorized("Token expired"));
        }

        match self.tokens.lock().unwrap().get(token) {
            Some(roles) => Ok(Caller::User(*roles)),
            None => Err(unauthorized("Invalid token")),
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized", "message": message })),
    )
        .into_response()
}

fn envelope(status: StatusCode, success: bool, message: &str, data: Value) -> Response {
    (
        status,
        Json(json!({
            "success": success,
            "message": message,
            "data": data,
            "timestamp": "2026-01-01T00:00:00",
        })),
    )
        .into_response()
}

fn ok(message: &str, data: Value) -> Response {
    envelope(StatusCode::OK, true, message, data)
}

fn fail(status: StatusCode, message: &str) -> Response {
    envelope(status, false, message, Value::Null)
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct StudentBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: Option<String>,
}

impl StudentBody {
    fn validate(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();

        let name_len = self.name.trim().chars().count();
        if name_len < 2 || name_len > 100 {
            errors.insert(
                "name".to_string(),
                "Name must be between 2 and 100 characters".to_string(),
            );
        }

        let email_ok = match self.email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !email_ok {
            errors.insert("email".to_string(), "Email should be valid".to_string());
        }

        if self.phone.as_deref().map_or(false, |p| p.chars().count() > 20) {
            errors.insert(
                "phone".to_string(),
                "Phone number must not exceed 20 characters".to_string(),
            );
        }

        errors
    }

    fn into_student(self, id: i64) -> Student {
        Student {
            id: Some(id),
            name: self.name,
            email: self.email,
            phone: self.phone.filter(|p| !p.is_empty()),
        }
    }
}

fn validation_failed(errors: BTreeMap<String, String>) -> Response {
    envelope(
        StatusCode::BAD_REQUEST,
        false,
        "Validation failed",
        json!(errors),
    )
}

type Shared = Arc<Backend>;

async fn login(State(backend): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    if backend.fail_logins.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal Server Error", "message": "Login service unavailable" })),
        )
            .into_response();
    }

    match account(&body.username) {
        Some(account) if account.password == body.password => {
            let token = format!("token-{}", body.username);
            backend
                .tokens
                .lock()
                .unwrap()
                .insert(token.clone(), account.roles);
            backend.expired.lock().unwrap().remove(&token);

            Json(json!({
                "token": token,
                "type": "Bearer",
                "username": body.username,
                "roles": account.roles,
            }))
            .into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Authentication failed",
                "message": "Invalid username or password",
            })),
        )
            .into_response(),
    }
}

async fn list(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = backend.caller(&headers) {
        return response;
    }

    let students: Vec<Student> = backend.students.lock().unwrap().values().cloned().collect();
    ok("Students retrieved successfully", json!(students))
}

async fn search(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = backend.caller(&headers) {
        return response;
    }

    let name = params.get("name").cloned().unwrap_or_default().to_lowercase();
    let students: Vec<Student> = backend
        .students
        .lock()
        .unwrap()
        .values()
        .filter(|s| s.name.to_lowercase().contains(&name))
        .cloned()
        .collect();
    ok("Search completed successfully", json!(students))
}

async fn fetch(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(response) = backend.caller(&headers) {
        return response;
    }

    match backend.students.lock().unwrap().get(&id) {
        Some(student) => ok("Student retrieved successfully", json!(student)),
        None => fail(
            StatusCode::NOT_FOUND,
            &format!("Student not found with id: {}", id),
        ),
    }
}

async fn create(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<StudentBody>,
) -> Response {
    match backend.caller(&headers) {
        Ok(Caller::User(_)) => {}
        Ok(Caller::Anonymous) => return unauthorized("Full authentication is required"),
        Err(response) => return response,
    }

    let errors = body.validate();
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let mut students = backend.students.lock().unwrap();
    if students.values().any(|s| s.email == body.email) {
        return fail(
            StatusCode::CONFLICT,
            &format!("Student with email {} already exists", body.email),
        );
    }

    let mut next_id = backend.next_id.lock().unwrap();
    let id = *next_id;
    *next_id += 1;

    let student = body.into_student(id);
    students.insert(id, student.clone());
    envelope(
        StatusCode::CREATED,
        true,
        "Student created successfully",
        json!(student),
    )
}

async fn update(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StudentBody>,
) -> Response {
    match backend.caller(&headers) {
        Ok(Caller::User(_)) => {}
        Ok(Caller::Anonymous) => return unauthorized("Full authentication is required"),
        Err(response) => return response,
    }

    let errors = body.validate();
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let mut students = backend.students.lock().unwrap();
    if !students.contains_key(&id) {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("Student not found with id: {}", id),
        );
    }

    let student = body.into_student(id);
    students.insert(id, student.clone());
    ok("Student updated successfully", json!(student))
}

async fn remove(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    match backend.caller(&headers) {
        Ok(Caller::User(roles)) if roles.contains(&"ROLE_ADMIN") => {}
        Ok(Caller::User(_)) => return fail(StatusCode::FORBIDDEN, "Access denied"),
        Ok(Caller::Anonymous) => return unauthorized("Full authentication is required"),
        Err(response) => return response,
    }

    match backend.students.lock().unwrap().remove(&id) {
        Some(_) => ok("Student deleted successfully", Value::Null),
        None => fail(
            StatusCode::NOT_FOUND,
            &format!("Student not found with id: {}", id),
        ),
    }
}

/// Backend on an ephemeral port. Accounts: `admin`/`admin` (admin) and
/// `user`/`user`; issued tokens are `token-<username>`.
pub struct MockBackend {
    pub base_url: String,
    backend: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let backend: Shared = Arc::new(Backend::seeded());

        let router = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/students", get(list).post(create))
            .route("/api/students/search", get(search))
            .route("/api/students/{id}", get(fetch).put(update).delete(remove))
            .with_state(Arc::clone(&backend));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            backend,
        }
    }

    /// Authorization header of the most recent student request
    pub fn last_authorization(&self) -> Option<String> {
        self.backend.last_authorization.lock().unwrap().clone()
    }

    pub fn expire_token(&self, token: &str) {
        self.backend.expired.lock().unwrap().insert(token.to_string());
    }

    /// Answer every subsequent student request with `status` and a raw body
    pub fn fail_students_with(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        *self.backend.forced.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Make every subsequent login answer 500
    pub fn fail_logins(&self) {
        self.backend.fail_logins.store(true, Ordering::SeqCst);
    }

    pub fn student_count(&self) -> usize {
        self.backend.students.lock().unwrap().len()
    }
}
