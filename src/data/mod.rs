//! Fetching and caching of the gallery and metadata documents.

pub mod cache;
pub mod source;

pub use cache::FetchCache;
pub use source::{DataSource, FsDataSource};
