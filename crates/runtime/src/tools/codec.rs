//! Tool argument decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Arguments, ToolError};

/// What to do when a tool call's argument payload cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentPolicy {
    /// Invoke the tool with no arguments and let it report the problem.
    #[default]
    Lenient,
    /// Skip the invocation and return the decode error as the tool output.
    Strict,
}

/// Decode a model-emitted argument payload into a name to value mapping.
///
/// A blank payload is an empty mapping; anything else must be a JSON object.
pub fn decode_arguments(payload: &str) -> Result<Arguments, ToolError> {
    if payload.trim().is_empty() {
        return Ok(Arguments::new());
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::ArgumentDecode(format!(
            "expected a JSON object, got `{other}`"
        ))),
        Err(e) => Err(ToolError::ArgumentDecode(e.to_string())),
    }
}
