//! Sample data generation and shallow validation of imported JSON.

use chrono::{Local, NaiveDate};
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::{
    FieldSpec, ScalarKind, ScalarNode, SchemaNode, SelectOption, Template, TemplateSchema,
};
use crate::error::{DocResult, ValidationError};

const TEXTAREA_SAMPLE: &str = "Sample multi-line text content. This is an example of longer text that might be entered in a textarea field.";
const NUMBER_SAMPLE: i64 = 42;
const EMAIL_SAMPLE: &str = "example@domain.com";
const FALLBACK_SAMPLE: &str = "Sample Value";

/// Produces schema-conformant placeholder data. Dates use `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGenerator {
    today: NaiveDate,
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleGenerator {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn generate(&self, schema: &SchemaNode) -> Value {
        match schema {
            SchemaNode::Object(object) => Value::Object(
                object
                    .properties
                    .iter()
                    .map(|(key, child)| (key.clone(), self.generate(child)))
                    .collect(),
            ),
            SchemaNode::Array(array) => {
                let count = array.min_items.max(1);
                Value::Array((0..count).map(|_| self.generate(&array.item)).collect())
            }
            SchemaNode::Scalar(scalar) => self.scalar(scalar),
        }
    }

    pub fn generate_fields(&self, fields: &[FieldSpec]) -> Value {
        Value::Object(
            fields
                .iter()
                .map(|field| {
                    let value = match field.kind {
                        ScalarKind::Select => first_option(&field.options),
                        kind => self.placeholder(kind, Some(&field.label)),
                    };
                    (field.name.clone(), value)
                })
                .collect(),
        )
    }

    pub fn generate_template(&self, template: &Template) -> Value {
        let sample = match &template.schema {
            TemplateSchema::Fields(fields) => self.generate_fields(fields),
            TemplateSchema::Node(node) => self.generate(node),
        };
        debug!(template = %template.name, "generated sample data");
        sample
    }

    fn scalar(&self, node: &ScalarNode) -> Value {
        match node.kind {
            ScalarKind::Select => first_option(&node.options),
            other => self.placeholder(other, node.label.as_deref()),
        }
    }

    fn placeholder(&self, kind: ScalarKind, label: Option<&str>) -> Value {
        match kind {
            ScalarKind::Text => match label {
                Some(label) => json!(format!("Sample {label}")),
                None => json!("Sample Text"),
            },
            ScalarKind::Textarea => json!(TEXTAREA_SAMPLE),
            ScalarKind::Number => json!(NUMBER_SAMPLE),
            ScalarKind::Date => json!(self.today.format("%Y-%m-%d").to_string()),
            ScalarKind::Email => json!(EMAIL_SAMPLE),
            ScalarKind::Select => json!(FALLBACK_SAMPLE),
        }
    }
}

fn first_option(options: &[SelectOption]) -> Value {
    options
        .first()
        .map(|option| json!(option.value))
        .unwrap_or_else(|| json!(FALLBACK_SAMPLE))
}

/// Sample data for `schema` dated today.
pub fn generate_sample(schema: &SchemaNode) -> Value {
    SampleGenerator::new().generate(schema)
}

/// Parse `text` and check it is a map holding every required top-level property.
/// Nested objects are not inspected.
pub fn import_and_validate(text: &str, schema: &SchemaNode) -> DocResult<Value> {
    let value: Value = serde_json::from_str(text)?;
    let map = value.as_object().ok_or(ValidationError::NotAMapping)?;
    if let SchemaNode::Object(object) = schema {
        for (key, node) in &object.properties {
            if node.is_required() && !map.contains_key(key) {
                return Err(missing(key, node.label()).into());
            }
        }
    }
    Ok(value)
}

/// Same shallow check against a flat field list.
pub fn import_fields(text: &str, fields: &[FieldSpec]) -> DocResult<Value> {
    let value: Value = serde_json::from_str(text)?;
    let map = value.as_object().ok_or(ValidationError::NotAMapping)?;
    if let Some(field) = fields
        .iter()
        .find(|field| field.required && !map.contains_key(&field.name))
    {
        return Err(missing(&field.name, Some(&field.label)).into());
    }
    Ok(value)
}

pub fn import_for_template(text: &str, template: &Template) -> DocResult<Value> {
    match &template.schema {
        TemplateSchema::Fields(fields) => import_fields(text, fields),
        TemplateSchema::Node(node) => import_and_validate(text, node),
    }
}

fn missing(key: &str, label: Option<&str>) -> ValidationError {
    ValidationError::MissingRequired {
        key: key.to_string(),
        label: label.unwrap_or(key).to_string(),
    }
}
