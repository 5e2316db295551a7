//! Error types of the data pipeline.

use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error raised while building or iterating a dataset.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed annotation line or file.
    #[error("malformed annotation '{}' at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// An annotation or class names file could not be read.
    #[error("unable to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A dataset directory is missing or unreadable.
    #[error("unable to read directory '{}'", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// An image file is unreadable or corrupt.
    #[error("unable to decode image '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    /// The image and label directories of a split do not correspond.
    #[error(
        "images in '{}' do not match labels in '{}': {reason}",
        images_dir.display(),
        labels_dir.display()
    )]
    PairingMismatch {
        images_dir: PathBuf,
        labels_dir: PathBuf,
        reason: String,
    },
    /// An invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The joint image and box transform failed.
    #[error("augmentation failed: {0}")]
    Augment(String),
    /// A pipeline worker panicked or was cancelled.
    #[error("pipeline worker failed: {0}")]
    Worker(String),
}

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
