//! Synthesizes a gallery from the images in a directory.
//!
//! This module provides the `FileScanner` struct which handles:
//! - Recursive directory scanning using walkdir
//! - Image detection by file extension
//! - Orientation tagging from image header dimensions

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::image_loader::read_dimensions;
use crate::models::{GalleryDefinition, MediaItem, Orientation};

const IMAGE_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "webp", "avif", "gif", "bmp", "tif", "tiff",
];

/// Configuration for the file scanner.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 0, // unlimited
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DiscoveredImage {
    path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    relative: String,
    extension: String,
}

pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    /// Scans `dir` into a single gallery keyed `key`.
    pub async fn scan_gallery(&self, dir: &Path, key: &str) -> Result<GalleryDefinition> {
        let dir = dir.to_path_buf();
        let key = key.to_string();
        let config = self.config.clone();

        // Header reads are blocking IO
        task::spawn_blocking(move || Self::scan_gallery_sync(&dir, &key, &config))
            .await
            .context("Scan task panicked")?
    }

    fn scan_gallery_sync(dir: &Path, key: &str, config: &ScanConfig) -> Result<GalleryDefinition> {
        info!("Starting scan of {:?}", dir);
        let discovered = Self::discover_files(dir, config)?;

        let mut measured = 0;
        let items: Vec<MediaItem> = discovered
            .into_iter()
            .map(|entry| {
                let stem = entry
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&entry.relative)
                    .to_string();
                let item = MediaItem::new(entry.relative.clone())
                    .with_source(entry.extension.clone(), format!("/{}", entry.relative))
                    .with_alt(stem.clone())
                    .with_title(stem);
                match read_dimensions(&entry.path) {
                    Ok((w, h)) => {
                        measured += 1;
                        item.with_orientation(Orientation::classify(w, h))
                    }
                    Err(e) => {
                        warn!("Failed to read dimensions for {:?}: {:#}", entry.path, e);
                        item
                    }
                }
            })
            .collect();

        info!(
            "Scan complete: {} images, {} measured",
            items.len(),
            measured
        );
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(key)
            .to_string();
        Ok(GalleryDefinition::new(key, name, items))
    }

    /// Discovers all image files in a directory.
    fn discover_files(dir: &Path, config: &ScanConfig) -> Result<Vec<DiscoveredImage>> {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }
        let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);

        if !config.recursive {
            walker = walker.max_depth(1);
        } else if config.max_depth > 0 {
            walker = walker.max_depth(config.max_depth);
        }

        let mut entries = Vec::new();

        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            entries.push(DiscoveredImage {
                path: path.to_path_buf(),
                relative,
                extension,
            });
        }

        // Sort by path for consistent ordering
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Discovered {} images", entries.len());

        Ok(entries)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn create_test_image(path: &Path, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([200, 100, 50]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_scan_config_default() {
        let config = ScanConfig::default();
        assert!(config.recursive);
        assert_eq!(config.max_depth, 0);
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_discover_files_empty_dir() {
        let dir = tempdir().unwrap();
        let entries = FileScanner::discover_files(dir.path(), &ScanConfig::default()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_discover_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(FileScanner::discover_files(&missing, &ScanConfig::default()).is_err());
    }

    #[test]
    fn test_discover_files_recursive() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_test_image(&dir.path().join("root.png"), 4, 3);
        create_test_image(&subdir.join("nested.png"), 4, 3);
        File::create(dir.path().join("notes.txt")).unwrap();

        let entries = FileScanner::discover_files(dir.path(), &ScanConfig::default()).unwrap();
        let relative: Vec<&str> = entries.iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(relative, vec!["root.png", "subdir/nested.png"]);

        let config = ScanConfig {
            recursive: false,
            ..Default::default()
        };
        let entries = FileScanner::discover_files(dir.path(), &config).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_gallery_classifies_by_dimensions() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("a_wide.png"), 60, 20);
        create_test_image(&dir.path().join("b_tall.png"), 20, 40);
        create_test_image(&dir.path().join("c_square.png"), 20, 20);
        fs::write(dir.path().join("d_broken.jpg"), b"garbage").unwrap();

        let gallery = FileScanner::new()
            .scan_gallery(dir.path(), "scan")
            .await
            .unwrap();
        assert_eq!(gallery.key, "scan");
        assert_eq!(gallery.len(), 4);

        let orientations: Vec<(Orientation, bool)> = gallery
            .items
            .iter()
            .map(|i| (i.orientation, i.orientation_tagged))
            .collect();
        assert_eq!(
            orientations,
            vec![
                (Orientation::Pano, true),
                (Orientation::Portrait, true),
                (Orientation::Landscape, true),
                (Orientation::Landscape, false),
            ]
        );
        assert_eq!(gallery.items[0].sources.get("png").map(String::as_str), Some("/a_wide.png"));
        assert_eq!(gallery.items[1].title.as_deref(), Some("b_tall"));
    }
}
