//! The stable `{code,message}` error surface (§7) and its `IntoResponse`
//! conversion — one conversion point for every handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ghost_types::ErrorCode;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ghost_store::Error> for ApiError {
    fn from(err: ghost_store::Error) -> Self {
        match err {
            ghost_store::Error::NotFound(what) => ApiError::new(ErrorCode::GhostNotFound, what),
            other => ApiError::new(ErrorCode::InternalError, other.to_string()),
        }
    }
}

impl From<ghost_engine::Error> for ApiError {
    fn from(err: ghost_engine::Error) -> Self {
        ApiError::new(err.code(), err.to_string())
    }
}

impl From<ghost_cluster::Error> for ApiError {
    fn from(err: ghost_cluster::Error) -> Self {
        ApiError::new(ErrorCode::InternalError, err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct EnvelopeMeta {
    request_id: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
    meta: EnvelopeMeta,
}

fn code_str(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidBatch => "INVALID_BATCH",
        ErrorCode::BatchTooLarge => "BATCH_TOO_LARGE",
        ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
        ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        ErrorCode::MissingOrg => "MISSING_ORG",
        ErrorCode::MissingGhost => "MISSING_GHOST",
        ErrorCode::GhostNotFound => "GHOST_NOT_FOUND",
        ErrorCode::GhostNotApproved => "GHOST_NOT_APPROVED",
        ErrorCode::InsertFailed => "INSERT_FAILED",
        ErrorCode::ExecutionError => "EXECUTION_ERROR",
        ErrorCode::InternalError => "INTERNAL_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody { code: code_str(self.code), message: self.message },
            meta: EnvelopeMeta { request_id: uuid::Uuid::new_v4().to_string(), timestamp: chrono::Utc::now() },
        };
        let mut response = (status, Json(body)).into_response();
        if self.code == ErrorCode::RateLimitExceeded {
            response.headers_mut().insert("Retry-After", "60".parse().expect("static header value"));
        }
        response
    }
}
