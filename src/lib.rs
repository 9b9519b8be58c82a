//! Responsive photo-gallery layout with a lightbox viewer.
//!
//! Photos are packed into rows per orientation, the rows are interleaved for
//! variety, and the result is re-planned whenever the viewport crosses a
//! breakpoint. The modal viewer navigates the same gallery and captions each
//! photo from a side-band metadata document.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod image_loader;
pub mod layout;
pub mod metadata;
pub mod models;
pub mod scanner;
pub mod ui;
