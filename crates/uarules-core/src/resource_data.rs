// # Resource Data
//
// The host's field storage for one resource instance: an identifier slot plus
// a map of attribute name to JSON value. This is the only dynamically typed
// surface in the crate. Resource implementations convert to and from their own
// typed records at this edge and nowhere else.
//
// ## Paths
//
// Nested values are addressed with dotted paths, list elements by index:
// `configuration.0.target` is the `target` key of the first element of the
// `configuration` list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field storage for a single resource instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Remote identifier, absent until the resource exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// Attribute values keyed by schema attribute name
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl ResourceData {
    /// Create empty resource data with no identifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Create resource data from user configuration
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    /// The identifier, or `None` if the resource does not exist (yet)
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the identifier
    ///
    /// Setting an empty string clears it, which tells the host the resource
    /// is gone.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Clear the identifier
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// All attributes
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Look up a value by dotted path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.attributes.get(first)?;

        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Look up a value that is present and not the zero value of its type
    ///
    /// `null`, `""`, `false`, `0`, `[]` and `{}` all count as unset.
    pub fn get_ok(&self, path: &str) -> Option<&Value> {
        self.get(path).filter(|value| !is_zero(value))
    }

    /// String value at `path`, empty if absent or not a string
    pub fn get_str(&self, path: &str) -> String {
        self.get(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Boolean value at `path`, `false` if absent or not a boolean
    pub fn get_bool(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Set a top-level attribute
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Remove a top-level attribute
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
