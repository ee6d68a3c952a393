//! Unified error taxonomy and backend error-shape normalization.
//!
//! The backend is inconsistent about error bodies: depending on the
//! endpoint a rejection arrives as `{"message": ...}`, `{"detail": ...}`,
//! `{"error": ...}`, `{"non_field_errors": [...]}` or a bare field-error
//! map (`{"email": ["This field is required."]}`), sometimes nested under
//! an `errors` or `field_errors` key. [`normalize_error_response`] folds
//! all of these into one [`ApiError`] so callers match on categories, not
//! body shapes.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use clementine_core::CredentialError;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Client-facing error for every gateway, store, and checkout operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached us: connect failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The refresh flow failed (or a request 401'd after its one
    /// post-refresh retry); the session has been cleared.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// The backend accepted the request but rejected its content.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    /// State conflict, e.g. a default-resource race or an order-status
    /// transition the lifecycle forbids.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx with no recognizable body shape.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose payload is structurally valid JSON but does not
    /// carry what the operation needs (e.g. an auth response without
    /// tokens).
    #[error("unexpected response: {0}")]
    Unexpected(String),

    /// Credential storage failed.
    #[error("credential storage: {0}")]
    Credential(#[from] CredentialError),

    /// A success payload failed to decode.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this is a pure connectivity failure - the only category the
    /// offline-tolerant store policy is allowed to swallow.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// A validation error with a single field message, for client-side
    /// pre-flight checks.
    #[must_use]
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.to_owned(), vec![message.clone()]);
        Self::Validation {
            message,
            field_errors,
        }
    }
}

/// Keys that carry a human-readable message rather than field errors.
const MESSAGE_KEYS: &[&str] = &["message", "detail", "error"];

/// Keys that are never field names.
const RESERVED_KEYS: &[&str] = &[
    "message",
    "detail",
    "error",
    "non_field_errors",
    "errors",
    "field_errors",
    "status",
    "status_code",
    "code",
];

/// Fold a non-2xx response into the error taxonomy.
///
/// 401 is handled by the gateway before normalization ever runs; every
/// other status lands here.
#[must_use]
pub fn normalize_error_response(status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let object = parsed.as_ref().and_then(Value::as_object);

    let message = object.and_then(extract_message);
    let field_errors = object.map(extract_field_errors).unwrap_or_default();

    match status {
        404 => ApiError::NotFound(message.unwrap_or_else(|| "resource not found".to_owned())),
        409 => ApiError::Conflict(
            message.unwrap_or_else(|| "conflicting state on the server".to_owned()),
        ),
        _ if !field_errors.is_empty() => {
            let message = message
                .or_else(|| first_field_message(&field_errors))
                .unwrap_or_else(|| "validation failed".to_owned());
            ApiError::Validation {
                message,
                field_errors,
            }
        }
        _ => ApiError::Server {
            status,
            message: message.unwrap_or_else(|| truncate(body, 200)),
        },
    }
}

/// `message` | `detail` | `error` | `non_field_errors[0]`, in that order.
fn extract_message(object: &serde_json::Map<String, Value>) -> Option<String> {
    for key in MESSAGE_KEYS {
        if let Some(text) = object.get(*key).and_then(Value::as_str) {
            return Some(text.to_owned());
        }
    }

    object
        .get("non_field_errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Collect per-field messages from the body, looking inside `errors` /
/// `field_errors` wrappers first, then treating the top-level object itself
/// as a field map (the Django REST convention).
fn extract_field_errors(object: &serde_json::Map<String, Value>) -> FieldErrors {
    for wrapper in ["errors", "field_errors"] {
        if let Some(nested) = object.get(wrapper).and_then(Value::as_object) {
            let collected = collect_field_map(nested, false);
            if !collected.is_empty() {
                return collected;
            }
        }
    }

    collect_field_map(object, true)
}

fn collect_field_map(object: &serde_json::Map<String, Value>, skip_reserved: bool) -> FieldErrors {
    let mut field_errors = FieldErrors::new();

    for (key, value) in object {
        if skip_reserved && RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let messages: Vec<String> = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        if !messages.is_empty() {
            field_errors.insert(key.clone(), messages);
        }
    }

    field_errors
}

fn first_field_message(field_errors: &FieldErrors) -> Option<String> {
    field_errors
        .iter()
        .next()
        .and_then(|(field, messages)| messages.first().map(|m| format!("{field}: {m}")))
}

fn truncate(body: &str, limit: usize) -> String {
    if body.is_empty() {
        return "(empty response body)".to_owned();
    }
    body.chars().take(limit).collect()
}
