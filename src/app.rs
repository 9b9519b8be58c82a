//! Per-page context: configuration, the shared document cache, and the
//! wiring between documents, renderer and modal.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GalleryConfig;
use crate::data::{DataSource, FetchCache};
use crate::error::{DataLoadError, InitError};
use crate::layout::RowLimits;
use crate::metadata::{MetadataIndex, MetadataResolver};
use crate::models::{GalleryDefinition, GalleryDocument};
use crate::ui::{GalleryRenderer, MediaModal, ModalTemplate, RendererSettings};

pub struct GalleryContext<S: DataSource> {
    config: GalleryConfig,
    source: S,
    cache: FetchCache,
}

impl<S: DataSource> GalleryContext<S> {
    pub fn new(config: GalleryConfig, source: S) -> Self {
        Self {
            config,
            source,
            cache: FetchCache::new(),
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub async fn load_document(&self) -> Result<GalleryDocument, DataLoadError> {
        let url = self.config.gallery_document.as_str();
        let value = self.cache.get_json(&self.source, url).await?;
        let document = GalleryDocument::from_json(&value)?;
        info!(url, galleries = document.galleries().len(), "Loaded gallery document");
        Ok(document)
    }

    /// Loads the metadata document, or an empty index when it is unavailable.
    pub async fn load_metadata(&self) -> Arc<MetadataIndex> {
        let url = self.config.metadata_document.as_str();
        let loaded = match self.cache.get_json(&self.source, url).await {
            Ok(value) => MetadataIndex::from_json(&value),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(index) => {
                debug!(url, records = index.len(), "Loaded metadata document");
                Arc::new(index)
            }
            Err(e) => {
                warn!(url, error = %e, "Metadata unavailable, captions will be bare");
                Arc::new(MetadataIndex::default())
            }
        }
    }

    /// Picks `key` from the document, else its default gallery.
    pub fn select_gallery(
        document: &GalleryDocument,
        key: Option<&str>,
    ) -> Option<Arc<GalleryDefinition>> {
        match key {
            Some(key) => document.get(key).or_else(|| {
                warn!(key, "Unknown gallery, using default");
                document.default_gallery()
            }),
            None => document.default_gallery(),
        }
    }

    pub fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            transition: self.config.transition(),
            row_stagger: self.config.row_stagger(),
            format_preference: self.config.format_preference(),
        }
    }

    pub fn build_renderer(&self, limits: RowLimits) -> GalleryRenderer {
        GalleryRenderer::new(self.renderer_settings(), limits)
    }

    pub fn build_modal(&self) -> Result<MediaModal, InitError> {
        MediaModal::new(
            ModalTemplate::standard(),
            self.config.format_preference(),
            MetadataResolver::new(self.config.base_prefix.clone()),
        )
    }

    /// Drops cached documents.
    pub fn dispose(&self) {
        self.cache.clear();
    }
}
