//! Side-band photo metadata: records, path normalization and resolution.

pub mod path;
pub mod record;
pub mod resolver;

pub use path::normalize_path;
pub use record::{CaptureDate, GpsPosition, Lens, MetadataRecord};
pub use resolver::{MetadataIndex, MetadataResolver};
