//! The fixed JSON acknowledgment returned to every HTTP request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response body: `{"status":"ok"}` or `{"status":"error","error":"..."}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Ack {
    Ok,
    Error { error: String },
}

impl Ack {
    pub fn error(error: impl ToString) -> Self {
        Ack::Error { error: error.to_string() }
    }

    /// Pair the body with a status code.
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for Ack {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}
