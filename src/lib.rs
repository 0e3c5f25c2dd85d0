pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod host;
pub mod input;
pub mod loader;
pub mod playlist;
pub mod scroll;
pub mod tile;
pub mod viewport;

pub use engine::{Gallery, create_gallery};
pub use error::GalleryError;
