//! Filesystem and structured-document primitives for devscaffold
//!
//! Provides normalized paths, atomic I/O, content checksums, and a
//! format-agnostic parser that turns YAML/JSON/TOML documents into a
//! generic key-mapping tree.

pub mod checksum;
pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod keypath;
pub mod path;

pub use checksum::{compute_checksum, compute_file_checksum};
pub use config::ConfigStore;
pub use document::DocumentFormat;
pub use error::{Error, Result};
pub use keypath::{KeyPath, KeySegment};
pub use path::NormalizedPath;
