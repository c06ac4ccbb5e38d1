// PDF Markdown Service - HTTP microservice converting base64 PDFs to Markdown

pub mod config;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use pipeline::{load_pipeline, ConversionPipeline, PipelineHandle};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
