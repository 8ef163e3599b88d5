use ndarray::Array3;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub mod cifar10;

/// Image geometry of a single record
pub const HEIGHT: usize = 32;
pub const WIDTH: usize = 32;
pub const DEPTH: usize = 3;

pub const LABEL_BYTES: usize = 1;
pub const IMAGE_BYTES: usize = HEIGHT * WIDTH * DEPTH;
/// Stride of records in a batch file
pub const RECORD_BYTES: usize = LABEL_BYTES + IMAGE_BYTES;
/// Number of records held by every batch file
pub const ITEM_COUNT: usize = 10000;

/// Ordered (label, image) pairs. Images are (channel, row, column)
pub type Dataset = Vec<(u8, Array3<u8>)>;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Batch file {path:?} is truncated: {size} bytes, required {required} bytes")]
    Truncated {
        path: PathBuf,
        size: u64,
        required: u64,
    },

    #[error("Invalid reader config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl ReaderError {
    /// The file was missing or unreadable ("bad path")
    pub fn is_io(&self) -> bool {
        matches!(self, ReaderError::Io { .. })
    }

    /// The file exists but holds fewer bytes than a batch needs ("bad dataset")
    pub fn is_truncated(&self) -> bool {
        matches!(self, ReaderError::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
