//! The `{success, data, meta}` success half of the response envelope (§6);
//! [`crate::error::ApiError`] renders the failure half.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
struct Meta {
    request_id: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    data: T,
    meta: Meta,
}

/// Wraps `data` in the success envelope at the given status code.
pub fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = Envelope {
        success: true,
        data,
        meta: Meta { request_id: uuid::Uuid::new_v4().to_string(), timestamp: chrono::Utc::now() },
    };
    (status, Json(body)).into_response()
}
