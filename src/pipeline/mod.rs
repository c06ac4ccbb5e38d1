//! Document conversion pipeline
//!
//! The HTTP layer never talks to a converter directly. It holds a
//! [`PipelineHandle`], built once at startup by [`load_pipeline`], and every
//! conversion goes through [`PipelineHandle::convert`].
//!
//! Backends:
//! - `native` - in-process text extraction with lopdf
//! - `command` - an external converter executable (e.g. `marker_single`)

pub mod command;
pub mod markdown;
pub mod native;

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::{PipelineBackend, PipelineConfig};

pub use command::CommandPipeline;
pub use native::NativePipeline;

// =============================================================================
// Pipeline Types
// =============================================================================

/// Per-call conversion options
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Maximum number of pages to process (`None` = all pages)
    pub max_pages: Option<usize>,

    /// Document languages (`None` = automatic detection)
    pub langs: Option<Vec<String>>,

    /// Batch size multiplier forwarded to model-backed converters
    pub batch_multiplier: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            langs: None,
            batch_multiplier: 2,
        }
    }
}

/// An image found in the converted document
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub name: String,
    pub format: Option<String>,
    pub size: usize,
}

/// Raw pipeline result before it is reshaped into a response
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub markdown: String,
    pub images: Option<Vec<ExtractedImage>>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PipelineOutput {
    /// Page count as reported in the metadata mapping, 0 when absent.
    pub fn pages(&self) -> u64 {
        self.metadata
            .get("pages")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    pub fn images_extracted(&self) -> usize {
        self.images.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid PDF document: {0}")]
    InvalidPdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("converter executable not found: {0}")]
    CommandNotFound(String),

    #[error("converter exited with status {status}: {stderr}")]
    Command { status: i32, stderr: String },

    #[error("converter produced no markdown output")]
    MissingOutput,

    #[error("conversion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("pipeline is no longer accepting work")]
    Closed(#[from] tokio::sync::AcquireError),
}

// =============================================================================
// Pipeline Trait
// =============================================================================

#[async_trait]
pub trait ConversionPipeline: Send + Sync {
    /// Short backend identifier used in logs
    fn name(&self) -> &'static str;

    async fn convert(&self, pdf: Bytes, options: &ConvertOptions) -> Result<PipelineOutput, PipelineError>;
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Immutable, process-wide handle to the loaded pipeline.
///
/// Calls are admitted through a semaphore so a backend that is not safe for
/// concurrent use only ever sees as many in-flight conversions as it has
/// permits (one by default).
#[derive(Clone)]
pub struct PipelineHandle {
    pipeline: Arc<dyn ConversionPipeline>,
    gate: Arc<Semaphore>,
    concurrency: usize,
}

impl PipelineHandle {
    pub fn new(pipeline: Arc<dyn ConversionPipeline>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            pipeline,
            gate: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.pipeline.name()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn convert(&self, pdf: Bytes, options: &ConvertOptions) -> Result<PipelineOutput, PipelineError> {
        let _permit = self.gate.acquire().await?;
        debug!(backend = self.pipeline.name(), "Pipeline slot acquired");

        self.pipeline.convert(pdf, options).await
    }
}

/// One-time pipeline initialization, run before the server accepts traffic.
pub async fn load_pipeline(config: &PipelineConfig) -> Result<PipelineHandle, PipelineError> {
    info!(backend = %config.backend, "Loading conversion pipeline...");

    let pipeline: Arc<dyn ConversionPipeline> = match config.backend {
        PipelineBackend::Native => Arc::new(NativePipeline::new()),
        PipelineBackend::Command => Arc::new(CommandPipeline::load(&config.command, config.extra_args.clone()).await?),
    };

    info!(
        backend = pipeline.name(),
        concurrency = config.concurrency,
        "Pipeline loaded successfully"
    );

    Ok(PipelineHandle::new(pipeline, config.concurrency))
}
