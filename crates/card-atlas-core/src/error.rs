use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack for atlas '{atlas}' at {scale}x")]
    EmptyAtlas { atlas: String, scale: u32 },
    #[error(
        "Image {path} is {}x{} but the atlas cell size is {}x{}",
        found.0, found.1, expected.0, expected.1
    )]
    CellSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("'{name}' in atlas '{atlas}' is both a plain image and a variant group")]
    TreeConflict { atlas: String, name: String },
    #[error("'{item}' in atlas '{atlas}' matched more than one naming pattern")]
    DuplicateMatch { atlas: String, item: String },
    #[error(
        "Atlas '{atlas}' has {found} at {scale}x but {expected} at the base scale {base_scale}x; \
         grid positions would differ between scales"
    )]
    ScaleMismatch {
        atlas: String,
        scale: u32,
        base_scale: u32,
        /// First differing record key at the base scale (`<end>` if the list is shorter).
        expected: String,
        /// Record key at the same ordinal at `scale`.
        found: String,
    },
    #[error("Unable to find mod root from {0}")]
    ModRootNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
