//! Directory scanning for when no gallery document is available.

pub mod file_scanner;

pub use file_scanner::{FileScanner, ScanConfig};
