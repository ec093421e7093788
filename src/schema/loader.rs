use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jsonschema::validator_for;
use serde_json::{Value, json};

use crate::domain::{
    ArrayNode, FieldSpec, ObjectNode, ScalarKind, ScalarNode, SchemaNode, SelectOption,
    Template, TemplateId, TemplateSchema,
};
use crate::error::{DocError, DocResult};
use crate::io::{DocumentFormat, parse_document_str};
use crate::path::{FieldPath, MAX_ITEMS, MAX_PATH_DEPTH};

use super::metadata::prettify_label;
use super::raw::{RawField, RawKind, RawNode, RawOption, RawTemplate};

/// JSON Schema every template document is checked against before parsing.
pub fn meta_schema() -> Value {
    let root = schemars::schema_for!(RawTemplate);
    serde_json::to_value(root).unwrap_or_else(|_| json!({"type": "object"}))
}

/// Read a template document from disk, picking the format from the file extension.
pub fn load_template_file(path: impl AsRef<Path>, id: TemplateId) -> Result<Template> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)
        .with_context(|| format!("unsupported template format: {}", path.display()))?;
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    load_template_str(&contents, format, id)
        .with_context(|| format!("failed to load template {}", path.display()))
}

pub fn load_template_str(contents: &str, format: DocumentFormat, id: TemplateId) -> Result<Template> {
    let value = parse_document_str(contents, format)?;
    let template = parse_template_value(&value, id)?;
    Ok(template)
}

/// Validate a template document and convert it into the domain model.
pub fn parse_template_value(value: &Value, id: TemplateId) -> DocResult<Template> {
    let document = normalize_document(value);
    validate_document(&document)?;
    let raw: RawTemplate = serde_json::from_value(document)
        .map_err(|err| DocError::InvalidSchema(err.to_string()))?;

    let schema = match (raw.schema, raw.fields) {
        (Some(node), None) => {
            let node = convert_node(node, &FieldPath::root(), 1)?;
            if !matches!(node, SchemaNode::Object(_)) {
                return Err(DocError::InvalidSchema(
                    "root schema must be an object".to_string(),
                ));
            }
            TemplateSchema::Node(node)
        }
        (None, Some(fields)) => TemplateSchema::Fields(
            fields
                .into_iter()
                .map(convert_field)
                .collect::<DocResult<Vec<_>>>()?,
        ),
        (Some(_), Some(_)) => {
            return Err(DocError::InvalidSchema(format!(
                "template `{}` declares both `schema` and `fields`",
                raw.name
            )));
        }
        (None, None) => {
            return Err(DocError::InvalidSchema(format!(
                "template `{}` declares neither `schema` nor `fields`",
                raw.name
            )));
        }
    };

    let mut template = Template::new(id, raw.name, schema);
    template.description = raw.description;
    Ok(template)
}

/// Parse a bare schema document (no name wrapper), as stored for schema templates.
pub fn parse_schema_value(value: &Value) -> DocResult<SchemaNode> {
    let wrapped = json!({"name": "schema", "schema": value});
    match parse_template_value(&wrapped, 0)?.schema {
        TemplateSchema::Node(node) => Ok(node),
        TemplateSchema::Fields(_) => Err(DocError::InvalidSchema(
            "expected a schema tree".to_string(),
        )),
    }
}

fn validate_document(document: &Value) -> DocResult<()> {
    let validator = validator_for(&meta_schema())
        .map_err(|err| DocError::InvalidSchema(format!("meta-schema did not compile: {err}")))?;
    let problems: Vec<String> = validator
        .iter_errors(document)
        .map(|error| {
            let pointer = error.instance_path.to_string();
            if pointer.is_empty() {
                error.to_string()
            } else {
                format!("{pointer}: {error}")
            }
        })
        .collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(DocError::InvalidSchema(problems.join("; ")))
    }
}

/// A root `schema` written as a bare property map is wrapped into an object node.
fn normalize_document(value: &Value) -> Value {
    let mut document = value.clone();
    if let Some(schema) = document.get_mut("schema")
        && schema.is_object()
        && !is_node_shaped(schema)
    {
        let properties = std::mem::take(schema);
        *schema = json!({"type": "object", "properties": properties});
    }
    document
}

fn is_node_shaped(value: &Value) -> bool {
    value.get("type").is_some_and(Value::is_string)
        || value.get("properties").is_some_and(Value::is_object)
}

/// `mounted` counts how many copies of this node a fully seeded form renders.
fn convert_node(raw: RawNode, at: &FieldPath, mounted: usize) -> DocResult<SchemaNode> {
    if at.len() > MAX_PATH_DEPTH {
        return Err(DocError::InvalidSchema(format!(
            "`{}` is nested deeper than {MAX_PATH_DEPTH} levels",
            display(at)
        )));
    }
    let kind = raw.kind.unwrap_or(if raw.properties.is_some() {
        RawKind::Object
    } else if raw.item.is_some() {
        RawKind::Array
    } else {
        RawKind::Text
    });

    match kind {
        RawKind::Object => {
            let properties = raw
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(key, child)| {
                    let node = convert_node(child, &at.key(&key), mounted)?;
                    Ok((key, node))
                })
                .collect::<DocResult<_>>()?;
            Ok(SchemaNode::Object(ObjectNode {
                label: raw.label,
                required: raw.required,
                properties,
            }))
        }
        RawKind::Array => {
            let item = raw.item.ok_or_else(|| {
                DocError::InvalidSchema(format!("array `{}` has no item schema", display(at)))
            })?;
            let min_items = raw.min_items.unwrap_or(0) as usize;
            let copies = mounted.saturating_mul(min_items.max(1));
            if copies > MAX_ITEMS {
                return Err(DocError::InvalidSchema(format!(
                    "array `{}` would mount {copies} items at minimum, the limit is {MAX_ITEMS}",
                    display(at)
                )));
            }
            let item = convert_node(*item, &at.index(0), copies)?;
            Ok(SchemaNode::Array(ArrayNode {
                label: raw.label,
                required: raw.required,
                min_items,
                item: Box::new(item),
            }))
        }
        scalar => {
            if raw.properties.is_some() || raw.item.is_some() {
                return Err(DocError::InvalidSchema(format!(
                    "scalar `{}` cannot declare properties or items",
                    display(at)
                )));
            }
            Ok(SchemaNode::Scalar(ScalarNode {
                kind: scalar_kind(scalar).unwrap_or_default(),
                label: raw.label,
                required: raw.required,
                placeholder: raw.placeholder,
                options: convert_options(raw.options),
            }))
        }
    }
}

fn convert_field(raw: RawField) -> DocResult<FieldSpec> {
    let kind = match raw.kind {
        None => ScalarKind::Text,
        Some(kind) => scalar_kind(kind).ok_or_else(|| {
            DocError::InvalidSchema(format!("flat field `{}` must be a scalar", raw.name))
        })?,
    };
    Ok(FieldSpec {
        label: raw.label.unwrap_or_else(|| prettify_label(&raw.name)),
        name: raw.name,
        kind,
        required: raw.required,
        placeholder: raw.placeholder,
        options: convert_options(raw.options),
    })
}

fn scalar_kind(kind: RawKind) -> Option<ScalarKind> {
    match kind {
        RawKind::Text => Some(ScalarKind::Text),
        RawKind::Textarea => Some(ScalarKind::Textarea),
        RawKind::Number => Some(ScalarKind::Number),
        RawKind::Date => Some(ScalarKind::Date),
        RawKind::Email => Some(ScalarKind::Email),
        RawKind::Select => Some(ScalarKind::Select),
        RawKind::Object | RawKind::Array => None,
    }
}

fn convert_options(options: Vec<RawOption>) -> Vec<SelectOption> {
    options
        .into_iter()
        .map(|option| SelectOption {
            label: option.label.unwrap_or_else(|| option.value.clone()),
            value: option.value,
        })
        .collect()
}

fn display(at: &FieldPath) -> String {
    if at.is_root() {
        "<root>".to_string()
    } else {
        at.to_string()
    }
}
