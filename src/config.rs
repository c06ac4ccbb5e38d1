use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Development mode only changes how much error detail reaches the client.
    pub development: bool,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineBackend {
    Native,
    Command,
}

impl std::str::FromStr for PipelineBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(PipelineBackend::Native),
            "command" => Ok(PipelineBackend::Command),
            other => bail!("Unsupported pipeline backend: {}", other),
        }
    }
}

impl std::fmt::Display for PipelineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineBackend::Native => write!(f, "native"),
            PipelineBackend::Command => write!(f, "command"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub backend: PipelineBackend,
    pub command: String,
    pub extra_args: Vec<String>,
    pub concurrency: usize,
    pub batch_multiplier: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: PipelineBackend::Native,
            command: "marker_single".to_string(),
            extra_args: Vec::new(),
            concurrency: 1,
            batch_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = lookup("APP_ENV")
            .or_else(|| lookup("FLASK_ENV"))
            .unwrap_or_else(|| "production".to_string());

        let concurrency: usize = var_or("PIPELINE_CONCURRENCY", "1").parse()?;

        Ok(Self {
            server: ServerConfig {
                port: var_or("PORT", "5000").parse()?,
                host: var_or("HOST", "0.0.0.0"),
                development: environment.eq_ignore_ascii_case("development"),
                max_body_bytes: var_or("MAX_BODY_BYTES", "104857600").parse()?,
            },
            pipeline: PipelineConfig {
                backend: var_or("PIPELINE_BACKEND", "native").parse()?,
                command: var_or("PIPELINE_COMMAND", "marker_single"),
                extra_args: var_or("PIPELINE_ARGS", "")
                    .split_whitespace()
                    .map(|s| s.to_string())
                    .collect(),
                concurrency: concurrency.max(1),
                batch_multiplier: var_or("PIPELINE_BATCH_MULTIPLIER", "2").parse()?,
            },
            logging: LoggingConfig {
                log_dir: lookup("LOG_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
            },
        })
    }
}
