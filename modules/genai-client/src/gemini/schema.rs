use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Trait for types usable as Gemini structured output.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a Gemini-compatible response schema for this type.
    ///
    /// Gemini accepts an OpenAPI-style subset:
    /// 1. no `$ref` — nested schemas must be fully inlined
    /// 2. no `additionalProperties`, `$schema` or `definitions` keys
    /// 3. every property listed in `required`, nullable ones included
    fn gemini_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        inline_refs(&mut value);
        fix_object_schemas(&mut value);

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
            map.remove("title");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn fix_object_schemas(value: &mut serde_json::Value) {
    if let serde_json::Value::Object(map) = value {
        if map.get("type") == Some(&serde_json::Value::String("object".to_string())) {
            map.remove("additionalProperties");

            if let Some(serde_json::Value::Object(props)) = map.get("properties") {
                let all_keys: Vec<serde_json::Value> = props
                    .keys()
                    .map(|k| serde_json::Value::String(k.clone()))
                    .collect();
                map.insert("required".to_string(), serde_json::Value::Array(all_keys));
            }
        }

        for (_, v) in map.iter_mut() {
            fix_object_schemas(v);
        }
    } else if let serde_json::Value::Array(arr) = value {
        for item in arr.iter_mut() {
            fix_object_schemas(item);
        }
    }
}

fn inline_refs(value: &mut serde_json::Value) {
    let definitions = if let serde_json::Value::Object(map) = value {
        map.get("definitions").cloned()
    } else {
        None
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(ref_path)) = map.get("$ref").cloned() {
                if ref_path.starts_with("#/definitions/") {
                    let type_name = ref_path.trim_start_matches("#/definitions/");
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            if let Some(serde_json::Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    *value = all_of.into_iter().next().unwrap();
                    inline_refs_recursive(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct TestReading {
        value: f64,
        unit: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct TestExtraction {
        readings: Vec<TestReading>,
    }

    #[test]
    fn generates_an_object_schema() {
        let schema = TestExtraction::gemini_schema();
        assert!(schema.is_object());
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn no_ref_or_meta_keys_survive() {
        let schema = TestExtraction::gemini_schema();
        let text = serde_json::to_string(&schema).unwrap();
        assert!(!text.contains("$ref"));
        assert!(!text.contains("$schema"));
        assert!(!text.contains("additionalProperties"));
        assert!(!text.contains("definitions"));
    }

    #[test]
    fn all_properties_required_even_nullable() {
        let schema = TestReading::gemini_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
        assert!(names.contains(&"value"));
        assert!(names.contains(&"unit"));
    }

    #[test]
    fn nested_structs_are_inlined() {
        let schema = TestExtraction::gemini_schema();
        let items = &schema["properties"]["readings"]["items"];
        assert_eq!(items["type"], "object");
        assert!(items.get("$ref").is_none());
    }
}
