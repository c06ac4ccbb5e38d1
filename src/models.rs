use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pipeline::PipelineHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: PipelineHandle,
}

impl AppState {
    pub fn new(config: Config, pipeline: PipelineHandle) -> Self {
        Self { config, pipeline }
    }
}

pub const DEFAULT_FILENAME: &str = "document.pdf";

// API Request/Response types

/// Fields stay loosely typed so a wrong-typed value can be told apart from a
/// missing one.
#[derive(Debug, Deserialize)]
pub struct ConvertPdfRequest {
    #[serde(default, alias = "pdfBase64")]
    pub pdf_base64: Option<serde_json::Value>,
    #[serde(default)]
    pub filename: Option<serde_json::Value>,
}

impl ConvertPdfRequest {
    /// The supplied filename, or the placeholder when absent or not a string.
    pub fn filename(&self) -> &str {
        self.filename
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .unwrap_or(DEFAULT_FILENAME)
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertPdfResponse {
    pub success: bool,
    pub markdown: String,
    pub metadata: ConversionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ConversionMetadata {
    pub pages: u64,
    /// Always the character count of `markdown`, never the pipeline's figure.
    pub chars: usize,
    pub images_extracted: usize,
}

/// Reserved for local embedding generation; the route does not read it yet.
#[derive(Debug, Deserialize)]
pub struct EmbeddingsRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}
