//! Declarative response contracts for structured generation calls.
//!
//! A contract is sent to the backend as its `responseSchema` (advisory) and
//! checked again against the decoded answer before anything uses it
//! (authoritative). Validation reports the first violation with its JSON path
//! and never coerces values.

mod contracts;

use serde_json::{json, Map, Value};

pub use contracts::{
    analysis_contract, conclusion_contract, mission_contract, plan_contract, story_contract,
    ContractKind, MAX_OBJECTS_PER_TYPE, MAX_OBJECT_TYPES_PER_ROUND,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    String,
    Integer,
    /// Integer within `min..=max`.
    IntegerRange { min: i64, max: i64 },
    Enum(&'static [&'static str]),
    Array {
        items: Box<FieldShape>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(ObjectShape),
}

impl FieldShape {
    pub fn array_of(items: FieldShape) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn array_between(items: FieldShape, min_items: usize, max_items: Option<usize>) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: Some(min_items),
            max_items,
        }
    }

    pub fn integer_between(min: i64, max: i64) -> Self {
        Self::IntegerRange { min, max }
    }

    pub fn exactly(items: FieldShape, count: usize) -> Self {
        Self::array_between(items, count, Some(count))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub shape: FieldShape,
    pub required: bool,
    pub description: Option<&'static str>,
}

impl Field {
    pub fn required(name: &'static str, shape: FieldShape) -> Self {
        Self {
            name,
            shape,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: &'static str, shape: FieldShape) -> Self {
        Self {
            name,
            shape,
            required: false,
            description: None,
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectShape {
    pub fields: Vec<Field>,
}

impl ObjectShape {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response violates contract at {path}: {reason}")]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl SchemaViolation {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            reason: reason.into(),
        }
    }
}

/// Top-level contract for one generation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContract {
    pub kind: ContractKind,
    pub root: ObjectShape,
}

impl SchemaContract {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        validate_object(&self.root, value, "")
    }

    pub fn to_response_schema(&self) -> Value {
        object_schema(&self.root)
    }

    /// Minimal value that satisfies the contract.
    pub fn sample(&self) -> Value {
        sample_object(&self.root)
    }
}

fn validate_object(shape: &ObjectShape, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let Some(object) = value.as_object() else {
        return Err(SchemaViolation::new(path, "expected an object"));
    };
    for field in &shape.fields {
        let field_path = join_path(path, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(SchemaViolation::new(&field_path, "required field missing"));
                }
            }
            Some(inner) => validate_shape(&field.shape, inner, &field_path)?,
        }
    }
    Ok(())
}

fn validate_shape(shape: &FieldShape, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    match shape {
        FieldShape::String => {
            if !value.is_string() {
                return Err(SchemaViolation::new(path, "expected a string"));
            }
        }
        FieldShape::Integer => {
            if !(value.is_i64() || value.is_u64()) {
                return Err(SchemaViolation::new(path, "expected an integer"));
            }
        }
        FieldShape::IntegerRange { min, max } => {
            let Some(number) = value.as_i64() else {
                return Err(SchemaViolation::new(
                    path,
                    if value.is_u64() {
                        format!("expected an integer between {min} and {max}")
                    } else {
                        "expected an integer".to_string()
                    },
                ));
            };
            if number < *min || number > *max {
                return Err(SchemaViolation::new(
                    path,
                    format!("expected an integer between {min} and {max}, got {number}"),
                ));
            }
        }
        FieldShape::Enum(allowed) => {
            let Some(text) = value.as_str() else {
                return Err(SchemaViolation::new(path, "expected an enum string"));
            };
            if !allowed.contains(&text) {
                return Err(SchemaViolation::new(
                    path,
                    format!("'{text}' is not one of {}", allowed.join(", ")),
                ));
            }
        }
        FieldShape::Array {
            items,
            min_items,
            max_items,
        } => {
            let Some(rows) = value.as_array() else {
                return Err(SchemaViolation::new(path, "expected an array"));
            };
            if let Some(min) = min_items {
                if rows.len() < *min {
                    return Err(SchemaViolation::new(
                        path,
                        format!("expected at least {min} items, got {}", rows.len()),
                    ));
                }
            }
            if let Some(max) = max_items {
                if rows.len() > *max {
                    return Err(SchemaViolation::new(
                        path,
                        format!("expected at most {max} items, got {}", rows.len()),
                    ));
                }
            }
            for (idx, row) in rows.iter().enumerate() {
                validate_shape(items, row, &format!("{path}[{idx}]"))?;
            }
        }
        FieldShape::Object(object) => validate_object(object, value, path)?,
    }
    Ok(())
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn object_schema(shape: &ObjectShape) -> Value {
    let mut properties = Map::new();
    for field in &shape.fields {
        let mut schema = shape_schema(&field.shape);
        if let (Some(description), Some(obj)) = (field.description, schema.as_object_mut()) {
            obj.insert(
                "description".to_string(),
                Value::String(description.to_string()),
            );
        }
        properties.insert(field.name.to_string(), schema);
    }
    let required: Vec<Value> = shape
        .fields
        .iter()
        .filter(|field| field.required)
        .map(|field| Value::String(field.name.to_string()))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

fn shape_schema(shape: &FieldShape) -> Value {
    match shape {
        FieldShape::String => json!({ "type": "STRING" }),
        FieldShape::Integer => json!({ "type": "INTEGER" }),
        FieldShape::IntegerRange { min, max } => json!({
            "type": "INTEGER",
            "minimum": min,
            "maximum": max,
        }),
        FieldShape::Enum(allowed) => json!({
            "type": "STRING",
            "format": "enum",
            "enum": allowed,
        }),
        FieldShape::Array {
            items,
            min_items,
            max_items,
        } => {
            let mut schema = Map::new();
            schema.insert("type".to_string(), Value::String("ARRAY".to_string()));
            schema.insert("items".to_string(), shape_schema(items));
            if let Some(min) = min_items {
                schema.insert("minItems".to_string(), json!(min));
            }
            if let Some(max) = max_items {
                schema.insert("maxItems".to_string(), json!(max));
            }
            Value::Object(schema)
        }
        FieldShape::Object(object) => object_schema(object),
    }
}

fn sample_object(shape: &ObjectShape) -> Value {
    let mut object = Map::new();
    for field in &shape.fields {
        object.insert(field.name.to_string(), sample_shape(&field.shape));
    }
    Value::Object(object)
}

fn sample_shape(shape: &FieldShape) -> Value {
    match shape {
        FieldShape::String => Value::String("sample".to_string()),
        FieldShape::Integer => json!(1),
        FieldShape::IntegerRange { min, .. } => json!(min),
        FieldShape::Enum(allowed) => allowed
            .first()
            .map(|value| Value::String((*value).to_string()))
            .unwrap_or(Value::Null),
        FieldShape::Array {
            items, min_items, ..
        } => {
            let count = min_items.unwrap_or(1).max(1);
            Value::Array((0..count).map(|_| sample_shape(items)).collect())
        }
        FieldShape::Object(object) => sample_object(object),
    }
}
