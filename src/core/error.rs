// Centralized error handling for the client

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the backend API.
///
/// `message` is whatever the backend put in the body, if anything. Display
/// falls back to the status reason phrase; [`ApiError::server_message`] does not.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", .message.as_deref().unwrap_or("Unauthorized"))]
    Unauthorized { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("Forbidden"))]
    Forbidden { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("Not Found"))]
    NotFound { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("Bad Request"))]
    Validation {
        message: Option<String>,
        fields: BTreeMap<String, String>,
    },

    #[error("{}", .message.as_deref().unwrap_or("Conflict"))]
    Conflict { message: Option<String> },

    #[error("Request failed with status {status}: {}", message_or_reason(.message, .status))]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose envelope reports `success: false`
    #[error("{}", .message.as_deref().unwrap_or("Request rejected"))]
    Rejected { message: Option<String> },

    #[error("Response did not include data")]
    MissingData,

    #[error("Failed to reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

/// Error body shapes the backend produces: the envelope for the student
/// endpoints, `{error, message}` for the auth endpoint.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn message_or_reason<'a>(message: &'a Option<String>, status: &u16) -> &'a str {
    match message {
        Some(message) => message,
        None => StatusCode::from_u16(*status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Request failed"),
    }
}

/// Blank strings count as absent
pub(crate) fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

impl ApiError {
    /// Build an error from a non-success HTTP response
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

        let message = non_empty(parsed.message).or_else(|| non_empty(parsed.error));

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { message },
            StatusCode::FORBIDDEN => ApiError::Forbidden { message },
            StatusCode::NOT_FOUND => ApiError::NotFound { message },
            StatusCode::CONFLICT => ApiError::Conflict { message },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
                message,
                fields: collect_field_errors(parsed.data),
            },
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status the backend answered with, if the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Forbidden { .. } => Some(StatusCode::FORBIDDEN.as_u16()),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND.as_u16()),
            ApiError::Conflict { .. } => Some(StatusCode::CONFLICT.as_u16()),
            ApiError::Validation { .. } => Some(StatusCode::BAD_REQUEST.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message supplied by the backend. `None` when the body carried none,
    /// so callers can fall back to their own wording.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::Rejected { message }
            | ApiError::Validation { message, .. }
            | ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Per-field validation messages, for validation failures only
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ApiError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

fn collect_field_errors(data: Option<serde_json::Value>) -> BTreeMap<String, String> {
    match data {
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(field, value)| match value {
                serde_json::Value::String(s) => Some((field, s)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Errors raised by durable session storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt storage file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode storage contents: {0}")]
    Encode(serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}
