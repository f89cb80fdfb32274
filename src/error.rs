//! Error taxonomy for the archive Q&A pipeline.
//!
//! Fetch and service failures are recovered close to where they happen (an article is
//! skipped, a strategy yields nothing). Only configuration, document output and a run that
//! produced nothing at all reach the binary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// A page could not be retrieved.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A completion call failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed completion payload: {0}")]
    Malformed(String),

    #[error("no API key configured (set completion.api_key or ${env})")]
    MissingApiKey { env: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("no Q&A records to render")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Crate-level error surfaced to the binary.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("nothing produced; check filters/configuration")]
    NothingProduced,
}
