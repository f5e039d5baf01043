//! Format-agnostic typed configuration loading

use crate::document::DocumentFormat;
use crate::{Error, NormalizedPath, Result, io};
use serde::de::DeserializeOwned;

/// Loads typed configuration from TOML, JSON or YAML files.
///
/// The format is detected from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        let format = DocumentFormat::from_path(path)?;
        let config_error = |message: String| Error::ConfigParse {
            path: path.to_native(),
            format: format.to_string(),
            message,
        };

        match format {
            DocumentFormat::Toml => toml::from_str(&content).map_err(|e| config_error(e.to_string())),
            DocumentFormat::Json => {
                serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))
            }
        }
    }

    /// Load configuration if the file exists, `None` otherwise.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<Option<T>> {
        if !path.is_file() {
            tracing::debug!(path = %path, "No configuration file");
            return Ok(None);
        }
        self.load(path).map(Some)
    }
}
