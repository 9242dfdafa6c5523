//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolError;

/// Decoded tool arguments, keyed by parameter name.
pub type Arguments = Map<String, Value>;

/// Parameter schema declared by a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Property name to its JSON Schema.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Names of properties that must be present.
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    /// Check decoded arguments against the declared properties.
    ///
    /// Only required keys and top-level JSON types are checked. Unknown keys
    /// are passed through to the tool.
    pub fn validate(&self, arguments: &Arguments) -> Result<(), ToolError> {
        if let Some(missing) = self.required.iter().find(|k| !arguments.contains_key(*k)) {
            return Err(ToolError::SchemaViolation(format!(
                "missing required argument `{missing}`"
            )));
        }

        for (key, value) in arguments {
            let Some(expected) = self.properties.get(key).and_then(|p| p.get("type")) else {
                continue;
            };
            if !type_matches(expected, value) {
                let expected = match expected.as_str() {
                    Some(name) => name.to_string(),
                    None => expected.to_string(),
                };
                return Err(ToolError::SchemaViolation(format!(
                    "argument `{key}` should be {expected}, got {}",
                    json_type(value)
                )));
            }
        }

        Ok(())
    }
}

/// A tool as described by the tool-execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: ParameterSchema,
}

/// One element of a tool response, tagged by content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ToolContent {
    /// Create a text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }

    /// Create an element of a non-text type.
    pub fn other(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
        }
    }

    /// Text payload, if this is a text element.
    pub fn as_text(&self) -> Option<&str> {
        if self.kind == "text" {
            self.text.as_deref()
        } else {
            None
        }
    }
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => named_type_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| named_type_matches(name, value)),
        _ => true,
    }
}

fn named_type_matches(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
