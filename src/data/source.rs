use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::trace;

use crate::error::DataLoadError;

/// Anything that can fetch a document by URL.
pub trait DataSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, DataLoadError>>;
}

/// Serves documents from a directory, treating URLs as relative paths.
#[derive(Debug, Clone)]
pub struct FsDataSource {
    root: PathBuf,
}

impl FsDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let relative = crate::metadata::normalize_path(url, None);
        self.root.join(relative)
    }
}

impl DataSource for FsDataSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoadError> {
        let path = self.resolve(url);
        trace!(?path, url, "Reading document");
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DataLoadError::Status {
                url: url.to_string(),
                status: 404,
            },
            ErrorKind::PermissionDenied => DataLoadError::Status {
                url: url.to_string(),
                status: 403,
            },
            _ => DataLoadError::Io {
                url: url.to_string(),
                source: e,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_relative_urls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("galleries.json"), b"{}").unwrap();
        let source = FsDataSource::new(dir.path());

        assert_eq!(source.fetch("/galleries.json").await.unwrap(), b"{}");
        assert_eq!(source.fetch("./galleries.json?v=2").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_missing_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsDataSource::new(dir.path());
        let err = source.fetch("nope.json").await.unwrap_err();
        assert!(matches!(err, DataLoadError::Status { status: 404, .. }));
    }
}
