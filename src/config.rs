use log::{debug, info};
use serde_json::{Map, Value};
use std::{fs, path::Path};

use crate::error::ConfigError;

/// Serialization formats a dashboard file may be written in.
///
/// Selected by file extension only; the content is never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        // Text after the last dot of the file name, so `.json` is a JSON file.
        let ext = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()))
            .unwrap_or_default();
        Self::from_extension(&ext).ok_or(ConfigError::UnsupportedFormat(ext))
    }

    fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// A parsed dashboard document: arbitrary top-level keys plus a `boxes` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    document: Map<String, Value>,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        debug!("Loading {:?} config from {}", format, path.display());

        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileNotReadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let parsed = format
            .parse(&content)
            .map_err(|reason| ConfigError::MalformedContent {
                path: path.to_path_buf(),
                reason,
            })?;

        let cfg = Self::from_value(parsed).map_err(|e| match e {
            ConfigError::MalformedContent { reason, .. } => ConfigError::MalformedContent {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        info!("Loaded {} ({} boxes)", path.display(), cfg.raw_boxes().len());
        Ok(cfg)
    }

    /// Wraps an already-decoded document, checking it has the shape of a dashboard.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(document) = value else {
            return Err(ConfigError::MalformedContent {
                path: Default::default(),
                reason: "top-level document must be a mapping".to_string(),
            });
        };

        match document.get("boxes") {
            None => Err(ConfigError::MissingField("boxes".to_string())),
            Some(Value::Array(_)) => Ok(Config { document }),
            Some(_) => Err(ConfigError::InvalidField {
                field: "boxes".to_string(),
                reason: "expected a sequence of box records".to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// The raw box records, in document order.
    pub fn raw_boxes(&self) -> &[Value] {
        match self.document.get("boxes") {
            Some(Value::Array(boxes)) => boxes,
            _ => &[],
        }
    }

    /// Top-level settings with the `boxes` key left out, for handing to the page.
    pub fn settings(&self) -> Map<String, Value> {
        self.document
            .iter()
            .filter(|(key, _)| key.as_str() != "boxes")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
