// Error taxonomy and the JSON error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::error::Error as _;

use crate::pipeline::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// The carried detail stays server-side; clients get a fixed string.
    #[error("Invalid base64 encoding")]
    Decode(String),

    #[error("PDF conversion failed: {0}")]
    Conversion(#[from] PipelineError),

    #[error("{0}")]
    NotImplemented(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// `{"success": false, "error": "..."}`, shared by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Full cause chain, e.g. `PDF conversion failed: ... <- I/O error: ...`.
    pub fn detail_chain(&self) -> String {
        let mut chain = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            chain.push_str(" <- ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        chain
    }

    /// Render the error, attaching the cause chain to server errors when
    /// `verbose` is set (development mode).
    pub fn into_response_with(self, verbose: bool) -> Response {
        let status = self.status_code();
        let details = (verbose && status.is_server_error()).then(|| self.detail_chain());

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
