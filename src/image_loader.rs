use std::future::Future;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageReader;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::ImageLoadError;
use crate::metadata::normalize_path;
use crate::models::{FormatPreference, MediaItem};
use crate::ui::renderer::OrientationProbe;

const DEFAULT_CACHE_ENTRIES: usize = 64;

/// A photo that finished loading for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Loads the photo behind a candidate source URL.
pub trait ImageLoader: Send + Sync + 'static {
    fn load(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<LoadedImage, ImageLoadError>> + Send;
}

/// Reads image dimensions from the file header without decoding pixels.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {:?}", path))?
        .with_guessed_format()
        .context("Failed to guess image format")?;
    reader
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))
}

/// Serves images from a directory, remembering the dimensions of recent loads.
pub struct FsImageLoader {
    root: PathBuf,
    base_prefix: Option<String>,
    preference: FormatPreference,
    dimensions: Mutex<LruCache<String, (u32, u32)>>,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>, base_prefix: Option<String>, cache_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_entries)
            .or(NonZeroUsize::new(DEFAULT_CACHE_ENTRIES))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            root: root.into(),
            base_prefix,
            preference: FormatPreference::default(),
            dimensions: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn with_preference(mut self, preference: FormatPreference) -> Self {
        self.preference = preference;
        self
    }

    fn resolve(&self, source: &str) -> (String, PathBuf) {
        let relative = normalize_path(source, self.base_prefix.as_deref());
        let path = self.root.join(&relative);
        (relative, path)
    }

    pub fn cached_dimensions(&self, source: &str) -> Option<(u32, u32)> {
        let (key, _) = self.resolve(source);
        self.dimensions.lock().get(&key).copied()
    }

    fn dimensions_blocking(&self, source: &str) -> Option<(u32, u32)> {
        let (key, path) = self.resolve(source);
        if let Some(dims) = self.dimensions.lock().get(&key).copied() {
            return Some(dims);
        }
        match read_dimensions(&path) {
            Ok(dims) => {
                self.dimensions.lock().put(key, dims);
                Some(dims)
            }
            Err(e) => {
                debug!(?path, error = %e, "Could not measure image");
                None
            }
        }
    }
}

impl ImageLoader for FsImageLoader {
    async fn load(&self, source: &str) -> Result<LoadedImage, ImageLoadError> {
        let (key, path) = self.resolve(source);
        if let Some((width, height)) = self.dimensions.lock().get(&key).copied() {
            trace!(source, "Image dimensions cached");
            return Ok(LoadedImage {
                source: source.to_string(),
                width,
                height,
            });
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ImageLoadError::Missing(source.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ImageLoadError::Missing(source.to_string()));
            }
            Err(e) => {
                return Err(ImageLoadError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        }

        let read_path = path.clone();
        let (width, height) = tokio::task::spawn_blocking(move || read_dimensions(&read_path))
            .await
            .map_err(|e| ImageLoadError::Decode {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
            .map_err(|e| ImageLoadError::Decode {
                path: path.display().to_string(),
                message: format!("{e:#}"),
            })?;

        self.dimensions.lock().put(key, (width, height));
        debug!(source, width, height, "Loaded image");
        Ok(LoadedImage {
            source: source.to_string(),
            width,
            height,
        })
    }
}

impl OrientationProbe for FsImageLoader {
    fn dimensions(&self, item: &MediaItem) -> Option<(u32, u32)> {
        let source = item
            .best_source(&self.preference)
            .or(item.thumbnail.as_deref())?;
        self.dimensions_blocking(source)
    }
}
