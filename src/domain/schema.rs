use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::{FieldPath, Segment};

/// Input flavour of a scalar field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    #[default]
    Text,
    Textarea,
    Number,
    Date,
    Email,
    Select,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Textarea => "textarea",
            ScalarKind::Number => "number",
            ScalarKind::Date => "date",
            ScalarKind::Email => "email",
            ScalarKind::Select => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarNode {
    #[serde(rename = "type")]
    pub kind: ScalarKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub required: bool,
    pub properties: IndexMap<String, SchemaNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub required: bool,
    pub min_items: usize,
    pub item: Box<SchemaNode>,
}

/// Declarative shape of a template's data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum SchemaNode {
    Scalar(ScalarNode),
    Object(ObjectNode),
    Array(ArrayNode),
}

impl SchemaNode {
    pub fn scalar(kind: ScalarKind, label: impl Into<String>) -> Self {
        SchemaNode::Scalar(ScalarNode {
            kind,
            label: Some(label.into()),
            required: false,
            placeholder: None,
            options: Vec::new(),
        })
    }

    pub fn object<K, I>(label: Option<&str>, properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        SchemaNode::Object(ObjectNode {
            label: label.map(str::to_string),
            required: false,
            properties: properties
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        })
    }

    pub fn array(label: impl Into<String>, min_items: usize, item: SchemaNode) -> Self {
        SchemaNode::Array(ArrayNode {
            label: Some(label.into()),
            required: false,
            min_items,
            item: Box::new(item),
        })
    }

    pub fn with_required(mut self, required: bool) -> Self {
        match &mut self {
            SchemaNode::Scalar(node) => node.required = required,
            SchemaNode::Object(node) => node.required = required,
            SchemaNode::Array(node) => node.required = required,
        }
        self
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            SchemaNode::Scalar(node) => node.label.as_deref(),
            SchemaNode::Object(node) => node.label.as_deref(),
            SchemaNode::Array(node) => node.label.as_deref(),
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            SchemaNode::Scalar(node) => node.required,
            SchemaNode::Object(node) => node.required,
            SchemaNode::Array(node) => node.required,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            SchemaNode::Object(node) => Some(node),
            _ => None,
        }
    }

    /// Property schema for `key` when this node is an object.
    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        self.as_object()
            .and_then(|object| object.properties.get(key))
    }

    /// Element schema when this node is an array.
    pub fn item(&self) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Array(node) => Some(node.item.as_ref()),
            _ => None,
        }
    }

    /// Walk `path` through the schema; keys select properties, indices select the item schema.
    pub fn resolve(&self, path: &FieldPath) -> Option<&SchemaNode> {
        let mut current = self;
        for segment in path.segments() {
            current = match segment {
                Segment::Key(name) => current.child(name)?,
                Segment::Index(_) => current.item()?,
            };
        }
        Some(current)
    }

    /// Flatten the tree into dotted field descriptors, one per scalar or array node.
    pub fn flatten_fields(&self) -> Vec<FlatField> {
        let mut fields = Vec::new();
        collect_flat_fields(self, "", &mut fields);
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatFieldKind {
    Scalar(ScalarKind),
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatField {
    pub name: String,
    pub label: String,
    pub kind: FlatFieldKind,
    pub required: bool,
}

fn collect_flat_fields(node: &SchemaNode, prefix: &str, acc: &mut Vec<FlatField>) {
    match node {
        SchemaNode::Object(object) => {
            for (key, child) in &object.properties {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_flat_fields(child, &name, acc);
            }
        }
        SchemaNode::Array(array) => acc.push(FlatField {
            name: prefix.to_string(),
            label: array.label.clone().unwrap_or_else(|| prefix.to_string()),
            kind: FlatFieldKind::Array,
            required: array.required,
        }),
        SchemaNode::Scalar(scalar) => acc.push(FlatField {
            name: prefix.to_string(),
            label: scalar.label.clone().unwrap_or_else(|| prefix.to_string()),
            kind: FlatFieldKind::Scalar(scalar.kind),
            required: scalar.required,
        }),
    }
}

/// One entry of a flat (non-nested) template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: ScalarKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
