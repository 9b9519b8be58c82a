pub mod gallery;
pub mod media_item;
pub mod row_model;

pub use gallery::*;
pub use media_item::*;
pub use row_model::*;
