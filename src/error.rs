//! Stable error codes and the JSON error body shared by every route.
//!
//! DESIGN
//! ======
//! Service errors are `thiserror` enums. Each one implements `ErrorCode` so
//! the HTTP layer can surface a machine-stable code next to the human
//! message. Every failure is scoped to the operation that raised it; nothing
//! is retried or swallowed at this layer.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Maps an error variant to a stable machine-readable code.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

/// JSON body returned for every failed operation.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Error half of every handler's `Result`.
pub type ApiError = (StatusCode, Json<ErrorBody>);

/// Build the `(status, body)` pair for a service error.
pub fn api_error<E>(status: StatusCode, err: &E) -> ApiError
where
    E: ErrorCode + std::fmt::Display,
{
    (status, Json(ErrorBody { error: err.error_code(), message: err.to_string() }))
}
