//! Error types for devscaffold-fs

use std::path::PathBuf;

/// Result type for devscaffold-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devscaffold-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} document: {message}")]
    DocumentParse { format: String, message: String },

    #[error("Failed to serialize {format} document: {message}")]
    DocumentSerialize { format: String, message: String },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported document format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
