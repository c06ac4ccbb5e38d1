//! API Routes
//!
//! - `GET /health` - Fixed service identity
//! - `POST /convert-pdf` - PDF (base64) to Markdown
//! - `POST /generate-embeddings` - Placeholder, always 501

pub mod convert;
pub mod embeddings;
pub mod health;

use axum::Router;
use tracing::info;

use crate::middleware::{apply_body_limit, apply_cors, apply_trace};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_body_bytes = state.config.server.max_body_bytes;

    let router = Router::new()
        .merge(convert::router(state))
        .merge(embeddings::router())
        .merge(health::router());

    let router = apply_body_limit(router, max_body_bytes);
    let router = apply_cors(router);
    apply_trace(router)
}
