//! HTTP error responses.
//!
//! Every failure is rendered as `{ "error": "<message>" }`. Caller-side
//! problems (bad identifier, unreadable page) are 400; failures to obtain the
//! page at all are 500.

use armory_core::{Error, FailureStage};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// An error ready to be sent to an HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn internal() -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "internal server error".to_string() }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err.stage() {
            FailureStage::Input | FailureStage::Extract => StatusCode::BAD_REQUEST,
            FailureStage::Fetch | FailureStage::Cache => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: &self.message })).into_response()
    }
}
