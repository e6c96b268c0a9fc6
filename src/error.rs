//! Error taxonomy for the upload/analyze pipeline.
//!
//! Every variant maps to an HTTP status and a JSON body the page can
//! render inline. The missing-credential case is not here: it aborts
//! startup before the server binds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no file uploaded")]
    MissingFile,
    #[error("{0}")]
    InvalidImage(String),
    #[error("model call failed: {0}")]
    ModelCall(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Stable machine-readable tag carried in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingFile => "missing_file",
            AppError::InvalidImage(_) => "invalid_image",
            AppError::ModelCall(_) => "model_call",
            AppError::Unexpected(_) => "unexpected",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            AppError::ModelCall(_) => StatusCode::BAD_GATEWAY,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status(), Json(body)).into_response()
    }
}
