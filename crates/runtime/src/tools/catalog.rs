//! Translation of tool descriptors into completion-service functions.

use serde_json::json;

use super::{CatalogError, ToolDescriptor};
use crate::model::FunctionSpec;

/// Translate one descriptor, embedding its parameter schema.
pub fn to_function_spec(descriptor: &ToolDescriptor) -> FunctionSpec {
    let schema = &descriptor.input_schema;
    FunctionSpec {
        name: descriptor.name.clone(),
        description: descriptor.description.clone().unwrap_or_default(),
        parameters: json!({
            "type": "object",
            "properties": schema.properties,
            "required": schema.required,
        }),
    }
}

/// Translate a full catalog, one function per descriptor, in order.
pub fn to_function_specs(descriptors: &[ToolDescriptor]) -> Result<Vec<FunctionSpec>, CatalogError> {
    descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| {
            if descriptor.name.trim().is_empty() {
                Err(CatalogError::MissingToolName { index })
            } else {
                Ok(to_function_spec(descriptor))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParameterSchema;
    use serde_json::Map;

    fn descriptor(name: &str) -> ToolDescriptor {
        let mut properties = Map::new();
        properties.insert("language".into(), json!({ "type": "string" }));
        ToolDescriptor {
            name: name.to_string(),
            description: Some(format!("{name} tool")),
            input_schema: ParameterSchema {
                properties,
                required: vec!["language".into()],
            },
        }
    }

    #[test]
    fn embeds_schema_with_required_keys() {
        let spec = to_function_spec(&descriptor("search_snippets"));
        assert_eq!(spec.name, "search_snippets");
        assert_eq!(spec.description, "search_snippets tool");
        assert_eq!(
            spec.parameters,
            json!({
                "type": "object",
                "properties": { "language": { "type": "string" } },
                "required": ["language"]
            })
        );
    }

    #[test]
    fn preserves_order() {
        let specs = to_function_specs(&[descriptor("a"), descriptor("b")]).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn missing_name_fails() {
        let err = to_function_specs(&[descriptor("a"), descriptor("")]).unwrap_err();
        assert_eq!(err, CatalogError::MissingToolName { index: 1 });
    }

    #[test]
    fn missing_description_is_empty() {
        let mut d = descriptor("a");
        d.description = None;
        assert_eq!(to_function_spec(&d).description, "");
    }
}
