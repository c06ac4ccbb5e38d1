//! Conversion through an external converter executable.
//!
//! The converter is invoked as
//! `<program> <input.pdf> --output_dir <dir> [options] [extra args]`, which is
//! the calling convention of `marker_single`. Whatever it leaves in the output
//! directory is collected afterwards:
//! - the first `*.md` file is the document text
//! - `.png` / `.jpg` / `.jpeg` files are the extracted images
//! - `*_meta.json` objects are merged into the metadata mapping

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{ConversionPipeline, ConvertOptions, ExtractedImage, PipelineError, PipelineOutput};

const INPUT_FILE_NAME: &str = "input.pdf";

#[derive(Debug, Clone)]
pub struct CommandPipeline {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandPipeline {
    /// Resolve the converter executable. Fails when it cannot be found so the
    /// service never starts without a working pipeline.
    pub async fn load(program: &str, extra_args: Vec<String>) -> Result<Self, PipelineError> {
        let program = resolve_program(program)
            .ok_or_else(|| PipelineError::CommandNotFound(program.to_string()))?;
        info!(program = %program.display(), "Converter executable resolved");

        Ok(Self { program, extra_args })
    }

    fn build_args(&self, input: &Path, output_dir: &Path, options: &ConvertOptions) -> Vec<String> {
        let mut args = vec![
            input.to_string_lossy().to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
        ];

        if let Some(max_pages) = options.max_pages {
            args.push("--max_pages".to_string());
            args.push(max_pages.to_string());
        }
        if let Some(langs) = options.langs.as_ref().filter(|l| !l.is_empty()) {
            args.push("--langs".to_string());
            args.push(langs.join(","));
        }
        args.push("--batch_multiplier".to_string());
        args.push(options.batch_multiplier.to_string());

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl ConversionPipeline for CommandPipeline {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn convert(&self, pdf: Bytes, options: &ConvertOptions) -> Result<PipelineOutput, PipelineError> {
        // Removed on drop, including on every error path below.
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join(INPUT_FILE_NAME);
        let output_dir = workdir.path().join("out");
        tokio::fs::write(&input, &pdf).await?;
        tokio::fs::create_dir_all(&output_dir).await?;

        let args = self.build_args(&input, &output_dir, options);
        debug!(program = %self.program.display(), ?args, "Running converter");

        let output = Command::new(&self.program).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PipelineError::Command {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        collect_output(&output_dir).await
    }
}

/// Gather markdown, images and metadata from a finished converter run.
pub async fn collect_output(output_dir: &Path) -> Result<PipelineOutput, PipelineError> {
    let mut markdown_path: Option<PathBuf> = None;
    let mut images = Vec::new();
    let mut metadata: HashMap<String, serde_json::Value> = HashMap::new();

    let mut files = list_files(output_dir).await?;
    files.sort();

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "md" if markdown_path.is_none() => markdown_path = Some(path),
            "png" | "jpg" | "jpeg" => {
                let size = tokio::fs::metadata(&path).await?.len() as usize;
                images.push(ExtractedImage {
                    name: file_name,
                    format: Some(if extension == "png" { "png" } else { "jpeg" }.to_string()),
                    size,
                });
            }
            "json" if file_name.ends_with("_meta.json") => {
                let raw = tokio::fs::read(&path).await?;
                match serde_json::from_slice::<serde_json::Value>(&raw) {
                    Ok(serde_json::Value::Object(map)) => metadata.extend(map),
                    Ok(_) => warn!(file = %file_name, "Converter metadata is not a JSON object"),
                    Err(e) => warn!(file = %file_name, "Unreadable converter metadata: {}", e),
                }
            }
            _ => {}
        }
    }

    let markdown_path = markdown_path.ok_or(PipelineError::MissingOutput)?;
    let markdown = tokio::fs::read_to_string(&markdown_path).await?;
    metadata.insert("backend".to_string(), "command".into());

    Ok(PipelineOutput {
        markdown,
        images: Some(images),
        metadata,
    })
}

/// All regular files below `root`, recursively.
async fn list_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    Ok(files)
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}
