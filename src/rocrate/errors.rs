//! Error types for crate loading, conversion and repair
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested conversion or field update is not allowed.
    #[error("{0}")]
    Conversion(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A research area mapping line could not be used.
    #[error("research area mapping, line {line}: {message}")]
    Mapping { line: u64, message: String },

    #[error("invalid manifest: {0}")]
    Manifest(#[from] garde::Report),

    #[error("builder error: {0}")]
    Builder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound(path.as_ref().to_path_buf())
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    pub fn mapping(line: u64, message: impl Into<String>) -> Self {
        Self::Mapping {
            line,
            message: message.into(),
        }
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
