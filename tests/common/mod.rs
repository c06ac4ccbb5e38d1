//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use tower::ServiceExt;

use pdf_markdown_service::pipeline::{
    ConversionPipeline, ConvertOptions, ExtractedImage, NativePipeline, PipelineError, PipelineOutput,
};
use pdf_markdown_service::{create_router, AppState, Config, PipelineHandle};

/// What the fake pipeline does when called.
pub enum FakeBehavior {
    Succeed {
        markdown: String,
        reported_chars: u64,
        pages: Option<u64>,
        images: Option<usize>,
    },
    Fail(String),
}

/// Stand-in for the conversion pipeline that records how often it ran.
pub struct FakePipeline {
    pub behavior: FakeBehavior,
    pub calls: AtomicUsize,
}

impl FakePipeline {
    pub fn new(behavior: FakeBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionPipeline for FakePipeline {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn convert(&self, _pdf: Bytes, _options: &ConvertOptions) -> Result<PipelineOutput, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            FakeBehavior::Succeed {
                markdown,
                reported_chars,
                pages,
                images,
            } => {
                let mut metadata = HashMap::new();
                metadata.insert("chars".to_string(), Value::from(*reported_chars));
                if let Some(pages) = pages {
                    metadata.insert("pages".to_string(), Value::from(*pages));
                }
                Ok(PipelineOutput {
                    markdown: markdown.clone(),
                    images: images.map(|n| {
                        (0..n)
                            .map(|i| ExtractedImage {
                                name: format!("img_{i}.png"),
                                format: Some("png".to_string()),
                                size: 4,
                            })
                            .collect()
                    }),
                    metadata,
                })
            }
            FakeBehavior::Fail(message) => Err(PipelineError::InvalidPdf(message.clone())),
        }
    }
}

pub fn test_config(development: bool) -> Config {
    Config::from_lookup(|key| match key {
        "APP_ENV" if development => Some("development".to_string()),
        _ => None,
    })
    .expect("default config parses")
}

pub fn config_from(pairs: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .expect("test config parses")
}

pub fn app_with(pipeline: Arc<dyn ConversionPipeline>) -> Router {
    app_with_config(pipeline, test_config(false))
}

pub fn app_with_config(pipeline: Arc<dyn ConversionPipeline>, config: Config) -> Router {
    let concurrency = config.pipeline.concurrency;
    create_router(AppState::new(config, PipelineHandle::new(pipeline, concurrency)))
}

pub fn native_app() -> Router {
    app_with(Arc::new(NativePipeline::new()))
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, serde_json::to_string(&body).unwrap()).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// A small text-only PDF with one page per entry in `pages`.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf_inner(pages, false)
}

/// Same as [`build_pdf`], but the shared resources also carry a Type0 (CID)
/// font with no descendant font, which text extraction cannot set up.
pub fn build_pdf_with_unreadable_font(pages: &[&str]) -> Vec<u8> {
    build_pdf_inner(pages, true)
}

fn build_pdf_inner(pages: &[&str], unreadable_font: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let mut fonts = dictionary! {
        "F1" => font_id,
    };
    if unreadable_font {
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "BrokenCID",
            "Encoding" => "Identity-H",
        });
        fonts.set("F2", cid_font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
