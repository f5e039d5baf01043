//! Structured-document parsing into a generic key-mapping tree
//!
//! YAML, JSON and TOML documents are all decoded into a
//! [`serde_json::Value`] so that drift analysis and manifest inspection can
//! walk one tree type regardless of the on-disk format.

use crate::{Error, NormalizedPath, Result};
use serde_json::Value;

/// On-disk format of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a path's extension.
    pub fn from_path(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("");
        match extension.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        }
    }

    /// Parse raw bytes into a key-mapping tree.
    ///
    /// An empty YAML document decodes to `Value::Null`.
    pub fn parse(self, bytes: &[u8]) -> Result<Value> {
        let parse_error = |message: String| Error::DocumentParse {
            format: self.label().into(),
            message,
        };
        match self {
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| parse_error(e.to_string())),
            Self::Json => serde_json::from_slice(bytes).map_err(|e| parse_error(e.to_string())),
            Self::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
                toml::from_str(text).map_err(|e| parse_error(e.to_string()))
            }
        }
    }

    /// Serialize a tree back to bytes in this format.
    ///
    /// JSON output is pretty-printed with a trailing newline, which is how
    /// package managers write `package.json`.
    pub fn render(self, value: &Value) -> Result<Vec<u8>> {
        let serialize_error = |message: String| Error::DocumentSerialize {
            format: self.label().into(),
            message,
        };
        let text = match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| serialize_error(e.to_string()))?,
            Self::Json => {
                let mut text = serde_json::to_string_pretty(value)
                    .map_err(|e| serialize_error(e.to_string()))?;
                text.push('\n');
                text
            }
            Self::Toml => {
                toml::to_string_pretty(value).map_err(|e| serialize_error(e.to_string()))?
            }
        };
        Ok(text.into_bytes())
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
