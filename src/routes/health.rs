use axum::{response::Json as ResponseJson, routing::get, Json, Router};

use crate::models::HealthResponse;

pub const SERVICE_NAME: &str = "pdf-markdown-service";

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_check))
}

/// Fixed identity payload; never consults the pipeline.
async fn health_check() -> ResponseJson<HealthResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(response)
}
