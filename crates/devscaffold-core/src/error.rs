//! Error types for devscaffold-core

use std::path::PathBuf;

/// Result type for devscaffold-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in devscaffold-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reference template is missing from the store
    #[error("Reference template '{reference_id}' not found at {location}")]
    ReferenceNotFound {
        reference_id: String,
        location: String,
    },

    /// A reference template exists but cannot be used for comparison.
    ///
    /// The scaffold distribution itself is broken; the pass is aborted.
    #[error("Reference template '{reference_id}' is unverifiable: {reason}")]
    ReferenceUnverifiable { reference_id: String, reason: String },

    /// Two catalog entries share one reference id
    #[error("Duplicate reference id in catalog: {reference_id}")]
    DuplicateReference { reference_id: String },

    /// A catalog target path would escape the project directory
    #[error("Invalid target path for '{reference_id}': {path}")]
    InvalidTargetPath { reference_id: String, path: String },

    /// The planner was handed no observation for a catalog entry
    #[error("No observation supplied for artifact '{reference_id}'")]
    MissingObservation { reference_id: String },

    /// The dependency manifest does not exist and could not be created
    #[error("{path} does not exist and was unable to be auto-created. Please create one.")]
    ManifestUnavailable { path: PathBuf },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Filesystem error from devscaffold-fs
    #[error(transparent)]
    Fs(#[from] devscaffold_fs::Error),

    /// Probe or process error from devscaffold-presets
    #[error(transparent)]
    Presets(#[from] devscaffold_presets::Error),
}
