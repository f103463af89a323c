use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ThumbError {
    #[error("malformed cursor header: {0}")]
    MalformedHeader(String),

    #[error("no image frames found in cursor file")]
    NoFrames,

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("cached thumbnail {path} is unreadable: {reason}")]
    DiskCacheCorrupt { path: PathBuf, reason: String },

    #[error("source asset {0} is unavailable")]
    SourceUnavailable(PathBuf),

    #[error("external decoder failed: {0}")]
    ExternalDecoderFailure(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ThumbError>;
