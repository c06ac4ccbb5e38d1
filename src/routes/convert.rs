use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{AppState, ConversionMetadata, ConvertPdfRequest, ConvertPdfResponse};
use crate::pipeline::ConvertOptions;
use crate::types::{AppError, AppResult};
use crate::utils::decode_base64_payload;

pub const MISSING_PAYLOAD_MESSAGE: &str = "Missing pdf_base64 in request body";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/convert-pdf", post(convert_pdf))
        .with_state(state)
}

/// POST /convert-pdf
///
/// Body: `{"pdf_base64": "...", "filename": "optional.pdf"}`
async fn convert_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    let verbose = state.config.server.development;

    match convert(&state, &body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response_with(verbose),
    }
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn convert(state: &AppState, body: &[u8]) -> AppResult<ConvertPdfResponse> {
    let request = parse_request(body)?;
    let filename = request.filename().to_string();

    let pdf = match &request.pdf_base64 {
        None => return Err(AppError::Validation(MISSING_PAYLOAD_MESSAGE.to_string())),
        Some(Value::String(payload)) => decode_base64_payload(payload).map_err(|e| {
            error!(filename = %filename, "Base64 decode error: {}", e);
            AppError::Decode(e.to_string())
        })?,
        Some(other) => {
            error!(filename = %filename, "Base64 decode error: payload is not a string: {}", other);
            return Err(AppError::Decode(format!("expected a string, got {}", other)));
        }
    };

    info!(filename = %filename, bytes = pdf.len(), "Converting PDF");

    // All pages, automatic language detection.
    let options = ConvertOptions {
        max_pages: None,
        langs: None,
        batch_multiplier: state.config.pipeline.batch_multiplier,
    };

    let output = state
        .pipeline
        .convert(Bytes::from(pdf), &options)
        .await
        .map_err(|e| {
            error!(filename = %filename, error = ?e, "PDF conversion error: {}", e);
            AppError::from(e)
        })?;

    let metadata = ConversionMetadata {
        pages: output.pages(),
        chars: output.markdown.chars().count(),
        images_extracted: output.images_extracted(),
    };

    info!(
        chars = metadata.chars,
        pages = metadata.pages,
        images = metadata.images_extracted,
        "Conversion successful"
    );

    Ok(ConvertPdfResponse {
        success: true,
        markdown: output.markdown,
        metadata,
    })
}

/// A body that is empty, not JSON, or not an object counts as missing the
/// payload field. A `null` payload is missing too.
fn parse_request(body: &[u8]) -> AppResult<ConvertPdfRequest> {
    serde_json::from_slice::<ConvertPdfRequest>(body).map_err(|e| {
        warn!("Unreadable conversion request body: {}", e);
        AppError::Validation(MISSING_PAYLOAD_MESSAGE.to_string())
    })
}
