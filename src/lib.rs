// Library exports for asset-thumbs

pub mod batch_loader;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod panel;
pub mod pipeline;

// Re-export commonly used types from pipeline
pub use error::{Result, ThumbError};
pub use pipeline::{
    decoder::{CursorDecoder, ExternalDecoder, InProcessDecoder},
    thumbnail_cache::{CacheKey, ThumbnailCache},
    xcur2png,
};
