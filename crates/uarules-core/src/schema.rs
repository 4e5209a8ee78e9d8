// # Resource Schema
//
// Describes the attributes a resource accepts and validates user
// configuration against that description before the host hands it to a
// lifecycle operation. Resource implementations never validate on their own;
// whatever reaches them has passed through here.

use serde::Serialize;
use serde_json::Value;

use crate::diag::{Diagnostic, Diagnostics};
use crate::resource_data::ResourceData;

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// JSON string
    String,
    /// JSON boolean
    Bool,
    /// List of nested objects
    Block,
}

/// Description of one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Attribute name
    pub name: &'static str,
    /// Value type
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// Must be set by the user
    pub required: bool,
    /// Changing it replaces the resource
    pub force_new: bool,
    /// Upper bound on block elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Accepted string values; empty means any
    #[serde(skip_serializing_if = "no_values")]
    pub allowed_values: &'static [&'static str],
    /// Human readable description
    pub description: &'static str,
    /// Attributes of each block element
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Attribute>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType, required: bool) -> Self {
        Self {
            name,
            kind,
            required,
            force_new: false,
            max_items: None,
            allowed_values: &[],
            description: "",
            nested: Vec::new(),
        }
    }

    /// A string the user must set
    pub fn required_string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String, true)
    }

    /// A boolean the user must set
    pub fn required_bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool, true)
    }

    /// An optional list of nested blocks
    pub fn optional_block(name: &'static str, nested: Vec<Attribute>) -> Self {
        let mut attribute = Self::new(name, AttributeType::Block, false);
        attribute.nested = nested;
        attribute
    }

    /// Mark as replacing the resource when changed
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Limit the number of block elements
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Restrict a string to a fixed set of values
    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = values;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn validate(&self, path: &str, value: Option<&Value>, diags: &mut Diagnostics) {
        let value = match value {
            None | Some(Value::Null) => {
                if self.required {
                    diags.push(Diagnostic::error(format!(
                        "The argument \"{}\" is required, but no definition was found.",
                        path
                    )));
                }
                return;
            }
            Some(value) => value,
        };

        match self.kind {
            AttributeType::String => {
                let Some(s) = value.as_str() else {
                    diags.push(type_error(path, "string"));
                    return;
                };
                if !self.allowed_values.is_empty() && !self.allowed_values.contains(&s) {
                    diags.push(Diagnostic::error(format!(
                        "expected {} to be one of {:?}, got {}",
                        path, self.allowed_values, s
                    )));
                }
            }
            AttributeType::Bool => {
                if !value.is_boolean() {
                    diags.push(type_error(path, "bool"));
                }
            }
            AttributeType::Block => {
                let Some(items) = value.as_array() else {
                    diags.push(type_error(path, "list of objects"));
                    return;
                };
                if let Some(max) = self.max_items
                    && items.len() > max
                {
                    diags.push(Diagnostic::error(format!(
                        "Too many {} blocks: no more than {} \"{}\" blocks are allowed",
                        path, max, path
                    )));
                }
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, index);
                    match item.as_object() {
                        Some(fields) => {
                            check_unknown(&item_path, fields.keys(), &self.nested, diags);
                            for nested in &self.nested {
                                nested.validate(
                                    &format!("{}.{}", item_path, nested.name),
                                    fields.get(nested.name),
                                    diags,
                                );
                            }
                        }
                        None => diags.push(type_error(&item_path, "object")),
                    }
                }
            }
        }
    }
}

fn no_values(values: &&'static [&'static str]) -> bool {
    values.is_empty()
}

fn type_error(path: &str, expected: &str) -> Diagnostic {
    Diagnostic::error(format!(
        "Inappropriate value for attribute \"{}\": {} required.",
        path, expected
    ))
}

fn check_unknown<'a>(
    prefix: &str,
    keys: impl Iterator<Item = &'a String>,
    attributes: &[Attribute],
    diags: &mut Diagnostics,
) {
    for key in keys {
        if !attributes.iter().any(|a| a.name == key.as_str()) {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            diags.push(Diagnostic::error(format!(
                "An argument named \"{}\" is not expected here.",
                path
            )));
        }
    }
}

/// Schema of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    /// Resource type name
    pub type_name: &'static str,
    /// Human readable description
    pub description: &'static str,
    /// Top-level attributes
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    /// Look up a top-level attribute
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes.iter().filter(|a| a.force_new).map(|a| a.name)
    }

    /// Validate user configuration
    ///
    /// Returns one diagnostic per problem; an empty list means the
    /// configuration is acceptable.
    pub fn validate(&self, data: &ResourceData) -> Diagnostics {
        let mut diags = Diagnostics::new();
        check_unknown("", data.attributes().keys(), &self.attributes, &mut diags);
        for attribute in &self.attributes {
            attribute.validate(attribute.name, data.get(attribute.name), &mut diags);
        }
        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::has_errors;
    use serde_json::json;

    fn schema() -> ResourceSchema {
        ResourceSchema {
            type_name: "test_resource",
            description: "test",
            attributes: vec![
                Attribute::required_string("zone_id").force_new(),
                Attribute::required_string("mode").one_of(&["block", "challenge"]),
                Attribute::required_bool("paused"),
                Attribute::optional_block(
                    "configuration",
                    vec![Attribute::required_string("value")],
                )
                .max_items(1),
            ],
        }
    }

    fn data(value: Value) -> ResourceData {
        match value {
            Value::Object(map) => ResourceData::from_attributes(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_valid_configuration() {
        let diags = schema().validate(&data(json!({
            "zone_id": "z",
            "mode": "block",
            "paused": false,
            "configuration": [{ "value": "curl" }]
        })));
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_missing_required() {
        let diags = schema().validate(&data(json!({ "mode": "block", "paused": true })));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("\"zone_id\" is required"));
    }

    #[test]
    fn test_wrong_types_and_values() {
        let diags = schema().validate(&data(json!({
            "zone_id": 7,
            "mode": "allow",
            "paused": "no"
        })));
        assert_eq!(diags.len(), 3);
        assert!(has_errors(&diags));
    }

    #[test]
    fn test_block_limits() {
        let diags = schema().validate(&data(json!({
            "zone_id": "z",
            "mode": "block",
            "paused": false,
            "configuration": [{ "value": "a" }, { "value": "b", "extra": 1 }]
        })));
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(diags.len(), 2, "{:?}", summaries);
        assert!(summaries.iter().any(|s| s.contains("Too many configuration blocks")));
        assert!(summaries.iter().any(|s| s.contains("configuration.1.extra")));
    }

    #[test]
    fn test_unknown_top_level_attribute() {
        let diags = schema().validate(&data(json!({
            "zone_id": "z",
            "mode": "block",
            "paused": false,
            "priority": 1
        })));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("\"priority\" is not expected"));
    }

    #[test]
    fn test_force_new_attributes() {
        let names: Vec<_> = schema().force_new_attributes().collect();
        assert_eq!(names, vec!["zone_id"]);
    }
}
