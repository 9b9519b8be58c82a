//! Fuzzy matching of image paths to metadata records.
//!
//! Metadata documents are keyed by whatever relative path the exporter used,
//! which rarely matches the URL the page actually displays (different base
//! directory, different rendition format). Matching therefore goes by base
//! file name first and only uses the full path and extension to break ties.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DataLoadError, MetadataLookupError};
use crate::metadata::path::{normalize_path, split_file_name};
use crate::metadata::record::MetadataRecord;

/// Raw metadata records in document order.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    entries: Vec<(String, Value)>,
}

impl MetadataIndex {
    pub fn from_json(value: &Value) -> Result<Self, DataLoadError> {
        let obj = value
            .as_object()
            .ok_or_else(|| DataLoadError::Shape("metadata document is not an object".into()))?;
        Ok(Self {
            entries: obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataResolver {
    base_prefix: Option<String>,
}

struct Candidate<'a> {
    key: &'a str,
    normalized: String,
    extension: Option<String>,
    value: &'a Value,
}

impl MetadataResolver {
    pub fn new(base_prefix: Option<String>) -> Self {
        Self { base_prefix }
    }

    pub fn base_prefix(&self) -> Option<&str> {
        self.base_prefix.as_deref()
    }

    /// Resolves the record for `path`, or an empty record when nothing
    /// matches or the match is malformed.
    pub fn resolve(&self, path: &str, index: &MetadataIndex) -> MetadataRecord {
        match self.try_resolve(path, index) {
            Ok(record) => record,
            Err(e) => {
                warn!(path, error = %e, "Metadata lookup failed");
                MetadataRecord::default()
            }
        }
    }

    pub fn try_resolve(
        &self,
        path: &str,
        index: &MetadataIndex,
    ) -> Result<MetadataRecord, MetadataLookupError> {
        let prefix = self.base_prefix.as_deref();
        let target = normalize_path(path, prefix);
        let (stem, extension) = split_file_name(&target);
        if stem.is_empty() {
            return Err(MetadataLookupError::EmptyPath(path.to_string()));
        }

        let candidates: Vec<Candidate<'_>> = index
            .entries
            .iter()
            .filter_map(|(key, value)| {
                let normalized = normalize_path(key, prefix);
                let (key_stem, key_ext) = split_file_name(&normalized);
                if !key_stem.eq_ignore_ascii_case(stem) {
                    return None;
                }
                let extension = key_ext;
                Some(Candidate {
                    key: key.as_str(),
                    normalized,
                    extension,
                    value,
                })
            })
            .collect();

        let chosen = match candidates.as_slice() {
            [] => {
                debug!(path, "No metadata for image");
                return Ok(MetadataRecord::default());
            }
            [only] => only,
            many => Self::break_tie(path, &target, extension.as_deref(), many),
        };

        MetadataRecord::from_value(chosen.key, chosen.value)
    }

    fn break_tie<'c, 'a>(
        path: &str,
        target: &str,
        extension: Option<&str>,
        candidates: &'c [Candidate<'a>],
    ) -> &'c Candidate<'a> {
        if let Some(exact) = candidates
            .iter()
            .find(|c| c.normalized.eq_ignore_ascii_case(target))
        {
            return exact;
        }
        if let Some(ext) = extension {
            if let Some(by_ext) = candidates
                .iter()
                .find(|c| c.extension.as_deref() == Some(ext))
            {
                return by_ext;
            }
        }
        let first = &candidates[0];
        warn!(
            path,
            chosen = first.key,
            candidates = candidates.len(),
            "Ambiguous metadata match, using first candidate"
        );
        first
    }
}
