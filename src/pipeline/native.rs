//! In-process conversion backed by lopdf.
//!
//! Parsing and text extraction are CPU bound, so the whole conversion runs on
//! the blocking thread pool.

use async_trait::async_trait;
use bytes::Bytes;
use lopdf::{Document, Object};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::markdown::{join_pages, page_to_markdown};
use super::{ConversionPipeline, ConvertOptions, ExtractedImage, PipelineError, PipelineOutput};

#[derive(Debug, Default)]
pub struct NativePipeline;

impl NativePipeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionPipeline for NativePipeline {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn convert(&self, pdf: Bytes, options: &ConvertOptions) -> Result<PipelineOutput, PipelineError> {
        if let Some(langs) = &options.langs {
            debug!(?langs, "Language hints are not used by the native backend");
        }

        let max_pages = options.max_pages;
        tokio::task::spawn_blocking(move || convert_document(&pdf, max_pages)).await?
    }
}

/// Synchronous conversion of an in-memory PDF.
pub fn convert_document(pdf: &[u8], max_pages: Option<usize>) -> Result<PipelineOutput, PipelineError> {
    let doc = Document::load_mem(pdf).map_err(|e| PipelineError::InvalidPdf(e.to_string()))?;

    let page_numbers: Vec<u32> = doc
        .get_pages()
        .into_keys()
        .take(max_pages.unwrap_or(usize::MAX))
        .collect();

    let (pages, failed_pages) = extract_pages(&page_numbers, |page| doc.extract_text(&[page]));

    let markdown = join_pages(pages);
    if markdown.is_empty() && !page_numbers.is_empty() {
        warn!(pages = page_numbers.len(), "No extractable text found; document may be scanned");
    }

    let mut metadata: HashMap<String, serde_json::Value> = HashMap::new();
    metadata.insert("pages".to_string(), page_numbers.len().into());
    metadata.insert("backend".to_string(), "native".into());
    if !failed_pages.is_empty() {
        metadata.insert("failed_pages".to_string(), failed_pages.into());
    }
    for (key, value) in document_info(&doc) {
        metadata.insert(key, value.into());
    }

    Ok(PipelineOutput {
        markdown,
        images: Some(collect_images(&doc)),
        metadata,
    })
}

/// Render each page to Markdown. A page whose text cannot be extracted (for
/// example one referencing a font lopdf cannot decode) still counts, with
/// empty text; its number is returned in the second list.
fn extract_pages<F, E>(page_numbers: &[u32], mut extract: F) -> (Vec<String>, Vec<u32>)
where
    F: FnMut(u32) -> Result<String, E>,
    E: std::fmt::Display,
{
    let mut pages = Vec::with_capacity(page_numbers.len());
    let mut failed = Vec::new();

    for &page in page_numbers {
        match extract(page) {
            Ok(text) => pages.push(page_to_markdown(&text)),
            Err(e) => {
                warn!(page, "Text extraction failed, page left empty: {}", e);
                failed.push(page);
                pages.push(String::new());
            }
        }
    }

    (pages, failed)
}

/// Every image XObject stored in the document.
fn collect_images(doc: &Document) -> Vec<ExtractedImage> {
    doc.objects
        .iter()
        .filter_map(|(id, object)| match object {
            Object::Stream(stream) => {
                let is_image = matches!(
                    stream.dict.get(b"Subtype"),
                    Ok(Object::Name(name)) if name.as_slice() == b"Image"
                );
                is_image.then(|| ExtractedImage {
                    name: format!("image_{}_{}", id.0, id.1),
                    format: stream.dict.get(b"Filter").ok().and_then(image_format),
                    size: stream.content.len(),
                })
            }
            _ => None,
        })
        .collect()
}

fn image_format(filter: &Object) -> Option<String> {
    let name = match filter {
        Object::Name(name) => name.as_slice(),
        // The last filter in a chain is the image encoding.
        Object::Array(filters) => match filters.last() {
            Some(Object::Name(name)) => name.as_slice(),
            _ => return None,
        },
        _ => return None,
    };

    match name {
        b"DCTDecode" => Some("jpeg".to_string()),
        b"JPXDecode" => Some("jp2".to_string()),
        b"JBIG2Decode" => Some("jbig2".to_string()),
        b"CCITTFaxDecode" => Some("ccitt".to_string()),
        b"FlateDecode" => Some("raw".to_string()),
        _ => None,
    }
}

/// Title, author and subject from the trailer's Info dictionary.
fn document_info(doc: &Document) -> Vec<(String, String)> {
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| obj.as_reference().ok())
        .and_then(|id| doc.get_object(id).ok());

    let Some(Object::Dictionary(dict)) = info else {
        return Vec::new();
    };

    let fields: [(&str, &[u8]); 3] = [
        ("title", b"Title".as_slice()),
        ("author", b"Author".as_slice()),
        ("subject", b"Subject".as_slice()),
    ];

    fields
        .into_iter()
        .filter_map(|(key, pdf_key)| match dict.get(pdf_key) {
            Ok(Object::String(bytes, _)) => {
                let value = decode_pdf_string(bytes);
                (!value.trim().is_empty()).then(|| (key.to_string(), value))
            }
            _ => None,
        })
        .collect()
}

/// PDF text strings are UTF-16BE when they start with a byte order mark,
/// otherwise UTF-8 or Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}
