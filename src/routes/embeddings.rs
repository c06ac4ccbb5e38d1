use axum::{response::IntoResponse, routing::post, Router};
use tracing::info;

use crate::types::AppError;

pub const NOT_IMPLEMENTED_MESSAGE: &str = "Not implemented yet - use OpenAI embeddings for now";

pub fn router() -> Router {
    Router::new()
        .route("/generate-embeddings", post(generate_embeddings))
}

/// Placeholder for local embedding generation (body: `EmbeddingsRequest`).
/// The body is never read, so even malformed JSON gets the 501.
async fn generate_embeddings() -> impl IntoResponse {
    info!("Embeddings requested; route not implemented");
    AppError::NotImplemented(NOT_IMPLEMENTED_MESSAGE.to_string())
}
