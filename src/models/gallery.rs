//! Gallery definitions and the gallery data document.
//!
//! The document is a JSON object whose keys are gallery keys, plus an optional
//! `_config` entry naming the default gallery:
//!
//! ```text
//! { "_config": { "defaultGallery": "trips" },
//!   "trips": { "name": "Trips", "images": [ { "id": "1", "sources": {...}, ... } ] } }
//! ```
//!
//! Parsing is lenient per entry: a malformed image or gallery is skipped with a
//! warning rather than failing the whole document.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DataLoadError;
use crate::models::{MediaItem, Orientation};

/// Key used for galleries synthesized from already-rendered items.
pub const SYNTHESIZED_GALLERY_KEY: &str = "page";

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryDefinition {
    pub key: String,
    pub name: String,
    pub items: Vec<MediaItem>,
}

impl GalleryDefinition {
    pub fn new(key: impl Into<String>, name: impl Into<String>, items: Vec<MediaItem>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            items,
        }
    }

    /// Wraps whatever items are already on screen into a single gallery.
    pub fn synthesized(items: Vec<MediaItem>) -> Self {
        Self::new(SYNTHESIZED_GALLERY_KEY, "Gallery", items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GalleryDocument {
    default_key: Option<String>,
    galleries: Vec<Arc<GalleryDefinition>>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "defaultGallery")]
    default_gallery: Option<String>,
}

#[derive(Deserialize)]
struct RawGallery {
    name: Option<String>,
    #[serde(default)]
    images: Vec<Value>,
}

#[derive(Deserialize)]
struct RawImage {
    id: Option<Value>,
    #[serde(default)]
    sources: BTreeMap<String, String>,
    thumbnail: Option<String>,
    alt: Option<String>,
    title: Option<String>,
    layout: Option<String>,
}

impl GalleryDocument {
    pub fn single(gallery: GalleryDefinition) -> Self {
        Self {
            default_key: Some(gallery.key.clone()),
            galleries: vec![Arc::new(gallery)],
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, DataLoadError> {
        let root = value
            .as_object()
            .ok_or_else(|| DataLoadError::Shape("gallery document is not an object".into()))?;

        let default_key = match root.get("_config") {
            Some(cfg) => match RawConfig::deserialize(cfg) {
                Ok(cfg) => cfg.default_gallery,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed _config entry");
                    None
                }
            },
            None => None,
        };

        let mut galleries = Vec::new();
        for (key, entry) in root {
            if key.starts_with('_') {
                continue;
            }
            let raw = match RawGallery::deserialize(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(gallery = %key, error = %e, "Skipping malformed gallery");
                    continue;
                }
            };
            let items = raw
                .images
                .iter()
                .enumerate()
                .filter_map(|(idx, image)| parse_image(key, idx, image))
                .collect::<Vec<_>>();
            debug!(gallery = %key, items = items.len(), "Parsed gallery");
            galleries.push(Arc::new(GalleryDefinition::new(
                key.clone(),
                raw.name.unwrap_or_else(|| key.clone()),
                items,
            )));
        }

        Ok(Self {
            default_key,
            galleries,
        })
    }

    pub fn galleries(&self) -> &[Arc<GalleryDefinition>] {
        &self.galleries
    }

    pub fn get(&self, key: &str) -> Option<Arc<GalleryDefinition>> {
        self.galleries.iter().find(|g| g.key == key).cloned()
    }

    /// The configured default gallery, or the first one when the configured
    /// key is missing or unknown.
    pub fn default_gallery(&self) -> Option<Arc<GalleryDefinition>> {
        self.default_key
            .as_deref()
            .and_then(|key| self.get(key))
            .or_else(|| self.galleries.first().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.galleries.is_empty()
    }
}

fn parse_image(gallery: &str, index: usize, value: &Value) -> Option<MediaItem> {
    let raw = match RawImage::deserialize(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(gallery, index, error = %e, "Skipping malformed image entry");
            return None;
        }
    };

    let id = match raw.id {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{gallery}-{index}"),
    };

    let mut item = MediaItem::new(id);
    item.sources = raw.sources;
    item.thumbnail = raw.thumbnail;
    item.alt = raw.alt;
    item.title = raw.title;

    match raw.layout.as_deref().map(Orientation::from_tag) {
        Some(Some(orientation)) => item = item.with_orientation(orientation),
        Some(None) => {
            debug!(gallery, id = %item.id, "Unknown layout tag, defaulting to landscape");
        }
        None => {}
    }

    Some(item)
}
