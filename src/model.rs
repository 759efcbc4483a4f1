//! Typed dashboard boxes built from the raw `boxes` records of a [`Config`].
//!
//! [`Config`]: crate::config::Config

use log::{debug, error};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::ConfigError;

const MANDATORY_FIELDS: [&str; 4] = ["title", "sizes", "color", "widget"];
const KNOWN_FIELDS: [&str; 6] = ["id", "title", "sizes", "color", "widget", "parameters"];

/// Identifier of a box: the record's own `id` value, or its position in `boxes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BoxId(Value);

impl BoxId {
    pub fn positional(index: usize) -> Self {
        BoxId(Value::from(index))
    }

    pub fn explicit(value: Value) -> Self {
        BoxId(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Compares against an id as it arrives in a query string.
    pub fn matches(&self, key: &str) -> bool {
        match &self.0 {
            Value::String(s) => s == key,
            other => other.to_string() == key,
        }
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl FromStr for Geometry {
    type Err = ConfigError;

    /// Parses `"x, y, width, height"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidGeometry(raw.to_string());

        let values = raw
            .split(',')
            .map(|token| token.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        match values[..] {
            [x, y, width, height] => Ok(Geometry {
                x,
                y,
                width,
                height,
            }),
            _ => Err(invalid()),
        }
    }
}

/// One widget on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardBox {
    pub id: BoxId,
    pub title: String,
    pub geometry: Geometry,
    pub color: String,
    pub widget: String,
    pub parameters: Map<String, Value>,
}

impl DashboardBox {
    /// Builds the box found at `index` of the `boxes` sequence.
    pub fn from_record(index: usize, record: &Value) -> Result<Self, ConfigError> {
        let Value::Object(fields) = record else {
            return Err(ConfigError::InvalidField {
                field: format!("boxes[{index}]"),
                reason: "expected a mapping".to_string(),
            });
        };

        if let Some(missing) = MANDATORY_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
            debug!("Box {} is missing '{}'", index, missing);
            return Err(ConfigError::MissingField(missing.to_string()));
        }

        for key in fields.keys().filter(|k| !KNOWN_FIELDS.contains(&k.as_str())) {
            debug!("Ignoring unknown key '{}' on box {}", key, index);
        }

        let id = match fields.get("id") {
            None | Some(Value::Null) => BoxId::positional(index),
            Some(explicit) => BoxId::explicit(explicit.clone()),
        };

        let parameters = match fields.get("parameters") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params.clone(),
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    field: "parameters".to_string(),
                    reason: "expected a mapping".to_string(),
                });
            }
        };

        Ok(DashboardBox {
            id,
            title: text_field(fields, "title")?,
            geometry: geometry_field(fields)?,
            color: text_field(fields, "color")?,
            widget: text_field(fields, "widget")?,
            parameters,
        })
    }

    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Text form of a scalar; `None` for mappings and sequences.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> Result<String, ConfigError> {
    let value = fields
        .get(name)
        .ok_or_else(|| ConfigError::MissingField(name.to_string()))?;
    scalar_text(value).ok_or_else(|| ConfigError::InvalidField {
        field: name.to_string(),
        reason: "expected text, found a mapping or sequence".to_string(),
    })
}

fn geometry_field(fields: &Map<String, Value>) -> Result<Geometry, ConfigError> {
    let value = fields
        .get("sizes")
        .ok_or_else(|| ConfigError::MissingField("sizes".to_string()))?;
    match scalar_text(value) {
        Some(raw) => raw.parse(),
        None => Err(ConfigError::InvalidGeometry(value.to_string())),
    }
}

/// Builds every box in order. The first bad record fails the whole batch,
/// and so does an id shared by two boxes.
pub fn build_all(records: &[Value]) -> Result<Vec<DashboardBox>, ConfigError> {
    let mut boxes: Vec<DashboardBox> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let built = DashboardBox::from_record(index, record)?;
        if let Some(first) = boxes.iter().position(|b| b.id == built.id) {
            error!(
                "Boxes {} and {} share id {}; ids must be unique",
                first, index, built.id
            );
            return Err(ConfigError::InvalidField {
                field: "id".to_string(),
                reason: format!(
                    "id {} is used by both boxes[{}] and boxes[{}]",
                    built.id, first, index
                ),
            });
        }
        boxes.push(built);
    }
    Ok(boxes)
}
