//! Label encoder for the breed classifier.
//!
//! The encoder maps model output indices to breed names. Two serializations
//! are supported:
//!
//! - a plain JSON array of class names, index = model output index;
//! - the "calibrated" checkpoint payload, a JSON object whose keys may carry
//!   a `model.` prefix and a `temperature` calibration entry. The prefix is
//!   stripped and `temperature` dropped before the `classes` array is read.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};

#[derive(Clone, Debug)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn from_classes(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(anyhow!("label encoder has no classes"));
        }
        Ok(Self { classes })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label encoder from {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid label encoder file {}", path.display()))?;

        let classes = match value {
            Value::Array(entries) => class_names(entries)?,
            Value::Object(map) => {
                let normalized = normalize_checkpoint_keys(map);
                let entries = normalized
                    .get("classes")
                    .and_then(Value::as_array)
                    .cloned()
                    .ok_or_else(|| {
                        anyhow!("label encoder {} has no classes array", path.display())
                    })?;
                class_names(entries)?
            }
            _ => return Err(anyhow!("label encoder {} has unexpected shape", path.display())),
        };
        Self::from_classes(classes)
    }

    pub fn class(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn class_names(entries: Vec<Value>) -> Result<Vec<String>> {
    entries
        .into_iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| anyhow!("label encoder class entry is not a string"))
        })
        .collect()
}

/// Normalize a calibrated checkpoint payload: drop the `temperature` entry
/// and strip the `model.` prefix from every remaining key.
pub(crate) fn normalize_checkpoint_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(key, _)| key != "temperature")
        .map(|(key, value)| match key.strip_prefix("model.") {
            Some(stripped) => (stripped.to_string(), value),
            None => (key, value),
        })
        .collect()
}
