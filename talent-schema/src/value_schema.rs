//! JSON-schema value-type fragments (spec §4.A).
//!
//! These mirror the `ValueType` hierarchy in the original SDK
//! (`schema.hpp`/`schema.cpp`: `NullType`, `BooleanType`, `NumberType`,
//! `IntegerType`, `StringType`, `ArrayType`, `ObjectType`) but as a single
//! enum rather than a class hierarchy — there's no virtual dispatch need in
//! Rust, just a `to_json` match.

use serde_json::{json, Map, Value};

/// A JSON-schema fragment describing the shape of a value.
#[derive(Debug, Clone)]
pub enum ValueSchema {
    /// `{"type": "null"}`
    Null,
    /// `{"type": "boolean"}`
    Boolean,
    /// `{"type": "number"}`, with no further constraints.
    Number,
    /// `{"type": "integer"}`, with no further constraints.
    Integer,
    /// A string schema: const value, enum, or length/pattern constraints.
    String(StringSchema),
    /// An array schema: either a positional `items` list or a `contains`
    /// schema, plus size/uniqueness constraints.
    Array(ArraySchema),
    /// An object schema: named properties, required list, additionalProperties.
    Object(ObjectSchema),
}

/// String value constraints — exactly one of `const`, `enum`, or the
/// length/pattern trio is normally set, matching the original's three
/// `StringType` constructors.
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    /// Exact value match.
    pub const_value: Option<String>,
    /// Allowed value set.
    pub enumeration: Option<Vec<String>>,
    /// Minimum string length.
    pub min_length: Option<u32>,
    /// Maximum string length.
    pub max_length: Option<u32>,
    /// Regex the value must match.
    pub pattern: Option<String>,
}

/// Array value constraints.
#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    /// Positional item schemas.
    pub items: Option<Vec<ValueSchema>>,
    /// A schema at least one element must satisfy.
    pub contains: Option<Box<ValueSchema>>,
    /// Minimum element count.
    pub min_items: Option<u32>,
    /// Maximum element count.
    pub max_items: Option<u32>,
    /// Whether elements must be unique.
    pub unique_items: Option<bool>,
    /// Whether elements beyond `items` are allowed.
    pub additional_items: Option<bool>,
}

/// Object value constraints.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Named property schemas, in declaration order.
    pub properties: Vec<(String, ValueSchema)>,
    /// Required property names.
    pub required: Vec<String>,
    /// Whether properties beyond `properties` are allowed.
    pub additional_properties: bool,
}

impl ValueSchema {
    /// Render this schema as its JSON-schema fragment.
    pub fn to_json(&self) -> Value {
        match self {
            ValueSchema::Null => json!({"type": "null"}),
            ValueSchema::Boolean => json!({"type": "boolean"}),
            ValueSchema::Number => json!({"type": "number"}),
            ValueSchema::Integer => json!({"type": "integer"}),
            ValueSchema::String(s) => {
                let mut j = Map::new();
                j.insert("type".into(), json!("string"));
                if let Some(c) = &s.const_value {
                    j.insert("const".into(), json!(c));
                    return Value::Object(j);
                }
                if let Some(e) = &s.enumeration {
                    j.insert("enum".into(), json!(e));
                    return Value::Object(j);
                }
                if let Some(min) = s.min_length {
                    j.insert("min_length".into(), json!(min));
                }
                if let Some(max) = s.max_length {
                    j.insert("max_length".into(), json!(max));
                }
                if let Some(p) = &s.pattern {
                    j.insert("pattern".into(), json!(p));
                }
                Value::Object(j)
            }
            ValueSchema::Array(a) => {
                let mut j = Map::new();
                j.insert("type".into(), json!("array"));
                if let Some(c) = &a.contains {
                    j.insert("contains".into(), c.to_json());
                }
                if let Some(items) = &a.items {
                    let arr: Vec<Value> = items.iter().map(ValueSchema::to_json).collect();
                    j.insert("items".into(), Value::Array(arr));
                }
                if let Some(max) = a.max_items {
                    j.insert("max_items".into(), json!(max));
                }
                if let Some(min) = a.min_items {
                    j.insert("min_items".into(), json!(min));
                }
                if let Some(u) = a.unique_items {
                    j.insert("unique_items".into(), json!(u));
                }
                if let Some(ai) = a.additional_items {
                    j.insert("additional_items".into(), json!(ai));
                }
                Value::Object(j)
            }
            ValueSchema::Object(o) => {
                let mut j = Map::new();
                j.insert("type".into(), json!("object"));
                let mut props = Map::new();
                for (name, schema) in &o.properties {
                    props.insert(name.clone(), schema.to_json());
                }
                j.insert("properties".into(), Value::Object(props));
                if !o.required.is_empty() {
                    j.insert("required".into(), json!(o.required));
                }
                j.insert("additionalProperties".into(), json!(o.additional_properties));
                Value::Object(j)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_const_wins_over_length_fields() {
        let s = ValueSchema::String(StringSchema {
            const_value: Some("echo".into()),
            min_length: Some(1),
            ..Default::default()
        });
        assert_eq!(s.to_json(), json!({"type": "string", "const": "echo"}));
    }

    #[test]
    fn object_schema_renders_required_and_additional() {
        let o = ValueSchema::Object(ObjectSchema {
            properties: vec![("func".into(), ValueSchema::String(StringSchema::default()))],
            required: vec!["func".into()],
            additional_properties: false,
        });
        let j = o.to_json();
        assert_eq!(j["required"], json!(["func"]));
        assert_eq!(j["additionalProperties"], json!(false));
        assert_eq!(j["properties"]["func"]["type"], json!("string"));
    }

    #[test]
    fn array_schema_with_positional_items() {
        let a = ValueSchema::Array(ArraySchema {
            items: Some(vec![ValueSchema::Integer, ValueSchema::String(StringSchema::default())]),
            ..Default::default()
        });
        let j = a.to_json();
        assert_eq!(j["items"][0]["type"], json!("integer"));
        assert_eq!(j["items"][1]["type"], json!("string"));
    }
}
