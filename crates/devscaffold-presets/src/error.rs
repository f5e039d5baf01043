//! Error types for devscaffold-presets

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] devscaffold_fs::Error),

    #[error("Command not found: {command}")]
    CommandNotFound { command: String },

    #[error("Failed to run {command}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest at {path} is not a JSON object")]
    ManifestShape { path: PathBuf },
}
