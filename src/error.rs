//! Error types shared across the gallery core.
//!
//! None of these are fatal: callers recover by falling back (data loads),
//! degrading the display (image loads), or dropping fields (metadata).

use thiserror::Error;

/// Failure to fetch or parse a gallery or metadata document.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("IO error fetching {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("JSON parse error in {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected document shape: {0}")]
    Shape(String),
}

/// Failure to load a photo shown in the modal.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Image not found: {0}")]
    Missing(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
}

/// Failure to resolve a metadata record for an image path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataLookupError {
    #[error("Malformed metadata record for {key}: {reason}")]
    Malformed { key: String, reason: String },
    #[error("Image path has no file name: {0:?}")]
    EmptyPath(String),
}

/// A component could not find what it needs to attach to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Gallery container is not mounted")]
    MissingContainer,
    #[error("Modal template is missing its {0} slot")]
    MissingTemplate(&'static str),
}
