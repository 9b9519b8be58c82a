use std::collections::BTreeMap;
use std::fmt;

/// Row-packing class of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Pano,
}

impl Orientation {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "landscape" => Some(Self::Landscape),
            "portrait" => Some(Self::Portrait),
            "pano" | "panorama" => Some(Self::Pano),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Pano => "pano",
        }
    }

    /// Classifies a measured image by aspect ratio.
    ///
    /// Wider than 2:1 is a panorama, narrower than 0.8 is portrait, and
    /// everything else (including near-square) packs as landscape.
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::Landscape;
        }
        let ratio = width as f64 / height as f64;
        if ratio > 2.0 {
            Self::Pano
        } else if ratio < 0.8 {
            Self::Portrait
        } else {
            // Squares (|ratio - 1| < 0.1) share the landscape rows.
            Self::Landscape
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format name -> URL for every rendition of one photo.
pub type CandidateSources = BTreeMap<String, String>;

/// Ordered list of formats, highest fidelity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPreference(Vec<String>);

impl FormatPreference {
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            formats
                .into_iter()
                .map(|f| f.into().trim().to_ascii_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        )
    }

    pub fn formats(&self) -> &[String] {
        &self.0
    }

    /// Picks the best URL from a candidate map.
    ///
    /// Formats are matched case-insensitively in preference order. A map that
    /// carries none of the preferred formats falls back to its first entry.
    pub fn pick<'a>(&self, sources: &'a CandidateSources) -> Option<&'a str> {
        for wanted in &self.0 {
            if let Some((_, url)) = sources
                .iter()
                .find(|(format, _)| format.eq_ignore_ascii_case(wanted))
            {
                return Some(url.as_str());
            }
        }
        sources.values().next().map(String::as_str)
    }
}

impl Default for FormatPreference {
    fn default() -> Self {
        Self::new(["avif", "webp", "jpeg", "jpg", "png"])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub orientation: Orientation,
    /// Whether `orientation` came from a `layout` tag rather than the default.
    pub orientation_tagged: bool,
    pub sources: CandidateSources,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
    pub alt: Option<String>,
}

impl MediaItem {
    /// Create an untagged item with no renditions.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            orientation: Orientation::Landscape,
            orientation_tagged: false,
            sources: CandidateSources::new(),
            thumbnail: None,
            title: None,
            alt: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self.orientation_tagged = true;
        self
    }

    pub fn with_source(mut self, format: impl Into<String>, url: impl Into<String>) -> Self {
        self.sources.insert(format.into(), url.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn best_source(&self, preference: &FormatPreference) -> Option<&str> {
        preference.pick(&self.sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_tags() {
        assert_eq!(Orientation::from_tag("Portrait"), Some(Orientation::Portrait));
        assert_eq!(Orientation::from_tag(" pano "), Some(Orientation::Pano));
        assert_eq!(Orientation::from_tag("square"), None);
        assert_eq!(Orientation::default(), Orientation::Landscape);
    }

    #[test]
    fn test_classify_aspect_ratios() {
        assert_eq!(Orientation::classify(4000, 1000), Orientation::Pano);
        assert_eq!(Orientation::classify(2000, 1000), Orientation::Landscape);
        assert_eq!(Orientation::classify(1000, 1500), Orientation::Portrait);
        assert_eq!(Orientation::classify(1000, 1050), Orientation::Landscape);
        assert_eq!(Orientation::classify(1600, 1000), Orientation::Landscape);
        assert_eq!(Orientation::classify(0, 100), Orientation::Landscape);
    }

    #[test]
    fn test_best_source_follows_preference() {
        let item = MediaItem::new("a")
            .with_source("jpg", "/img/a.jpg")
            .with_source("WEBP", "/img/a.webp");
        let pref = FormatPreference::default();
        assert_eq!(item.best_source(&pref), Some("/img/a.webp"));

        let jpg_first = FormatPreference::new(["jpg"]);
        assert_eq!(item.best_source(&jpg_first), Some("/img/a.jpg"));
    }

    #[test]
    fn test_best_source_falls_back_to_first_entry() {
        let item = MediaItem::new("a").with_source("heic", "/img/a.heic");
        assert_eq!(
            item.best_source(&FormatPreference::default()),
            Some("/img/a.heic")
        );
        assert_eq!(MediaItem::new("b").best_source(&FormatPreference::default()), None);
    }
}
