//! Gallery configuration.
//!
//! Loaded from a TOML file; every field has a default so a config file only
//! needs the values it overrides:
//!
//! ```toml
//! transition_ms = 250
//! base_prefix = "images"
//! format_preference = ["avif", "webp", "jpg"]
//!
//! [[breakpoints]]
//! min_width = 0
//! class = "mobile"
//! limits = { landscape_max = 1, portrait_max = 2, min_images = 1 }
//! ```
//!
//! `PHOTOROW_DEBOUNCE_MS` and `PHOTOROW_TRANSITION_MS` override the matching
//! timings at startup. Unknown keys are rejected.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::responsive::{default_breakpoints, Breakpoint, BreakpointTable};
use crate::models::FormatPreference;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Width breakpoints, ascending, first entry at 0.
    pub breakpoints: Vec<Breakpoint>,
    /// Fade duration for gallery switches; also the fallback timer.
    pub transition_ms: u64,
    /// Delay added per row when fading new rows in.
    pub row_stagger_ms: u64,
    /// Quiet period before a resize is acted on.
    pub resize_debounce_ms: u64,
    /// Path prefix stripped from image paths before matching (e.g. "images").
    pub base_prefix: Option<String>,
    /// Formats in preference order, highest fidelity first.
    pub format_preference: Vec<String>,
    /// Entries kept in the loaded-image cache.
    pub image_cache_entries: usize,
    /// Relative URL of the gallery document.
    pub gallery_document: String,
    /// Relative URL of the metadata document.
    pub metadata_document: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            breakpoints: default_breakpoints(),
            transition_ms: 300,
            row_stagger_ms: 60,
            resize_debounce_ms: 200,
            base_prefix: None,
            format_preference: FormatPreference::default().formats().to_vec(),
            image_cache_entries: 64,
            gallery_document: "galleries.json".to_string(),
            metadata_document: "metadata.json".to_string(),
        }
    }
}

fn env_millis(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!(name, value = %raw, "Ignoring non-numeric override");
            None
        }
    }
}

impl GalleryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(?path, "Loaded gallery config");
        Ok(config)
    }

    /// Path of the per-user config file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "photorow").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the per-user config when present, defaults otherwise.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(ms) = env_millis("PHOTOROW_DEBOUNCE_MS") {
            self.resize_debounce_ms = ms;
        }
        if let Some(ms) = env_millis("PHOTOROW_TRANSITION_MS") {
            self.transition_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        BreakpointTable::new(self.breakpoints.clone())?;
        if self.format_preference.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "format_preference must name at least one format".into(),
            ));
        }
        if self.image_cache_entries == 0 {
            return Err(ConfigError::Validation(
                "image_cache_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn breakpoint_table(&self) -> Result<BreakpointTable, ConfigError> {
        BreakpointTable::new(self.breakpoints.clone())
    }

    pub fn format_preference(&self) -> FormatPreference {
        FormatPreference::new(self.format_preference.iter().cloned())
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn row_stagger(&self) -> Duration {
        Duration::from_millis(self.row_stagger_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::responsive::{RowLimits, ViewportClass};

    #[test]
    fn test_defaults_validate() {
        let config = GalleryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.resize_debounce(), Duration::from_millis(200));
        assert_eq!(config.breakpoint_table().unwrap().entries().len(), 4);
    }

    #[test]
    fn test_partial_override() {
        let config = GalleryConfig::from_toml_str(
            r#"
            transition_ms = 120
            base_prefix = "images"

            [[breakpoints]]
            min_width = 0
            class = "mobile"
            limits = { landscape_max = 1, portrait_max = 1, min_images = 1 }

            [[breakpoints]]
            min_width = 900
            class = "desktop"
            limits = { landscape_max = 3, portrait_max = 3, min_images = 2 }
            "#,
        )
        .unwrap();
        assert_eq!(config.transition(), Duration::from_millis(120));
        assert_eq!(config.row_stagger_ms, 60);
        assert_eq!(config.base_prefix.as_deref(), Some("images"));

        let table = config.breakpoint_table().unwrap();
        let desktop = table.classify(1000.0);
        assert_eq!(desktop.class, ViewportClass::Desktop);
        assert_eq!(desktop.limits, RowLimits::new(3, 3, 2));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = GalleryConfig::from_toml_str("row_stager_ms = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GalleryConfig::from_toml_str("image_cache_entries = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = GalleryConfig::from_toml_str("breakpoints = []").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "row_stagger_ms = 15\n").unwrap();
        let config = GalleryConfig::load(&path).unwrap();
        assert_eq!(config.row_stagger(), Duration::from_millis(15));
    }
}
