use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotspotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid clip file: {0}")]
    InvalidClip(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("No metadata found at {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("Invalid metadata in {}: {reason}", .path.display())]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("No valid track data found for {}", .0.display())]
    NoValidTracks(PathBuf),

    #[error("Region for frame {got} does not continue track ending at frame {last}")]
    NonContiguousTrack { last: usize, got: usize },

    #[error("Track store error: {0}")]
    Store(String),

    #[error("Store lock error: {0}")]
    Lock(String),

    #[error("Worker protocol error: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Interrupted by operator")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, HotspotError>;
