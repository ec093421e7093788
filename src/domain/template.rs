use chrono::{DateTime, Utc};
use serde::Serialize;

use super::schema::{FieldSpec, SchemaNode};

pub type TemplateId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Flat list of named fields.
    Fields,
    /// Nested schema tree.
    Schema,
}

/// Addresses a template in a store; the two kinds live in separate id spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    Fields(TemplateId),
    Schema(TemplateId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSchema {
    Fields(Vec<FieldSpec>),
    Node(SchemaNode),
}

impl TemplateSchema {
    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateSchema::Fields(_) => TemplateKind::Fields,
            TemplateSchema::Node(_) => TemplateKind::Schema,
        }
    }

    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            TemplateSchema::Node(node) => Some(node),
            TemplateSchema::Fields(_) => None,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        match self {
            TemplateSchema::Fields(fields) => fields,
            TemplateSchema::Node(_) => &[],
        }
    }

    /// Number of top-level entries, used for listings.
    pub fn field_count(&self) -> usize {
        match self {
            TemplateSchema::Fields(fields) => fields.len(),
            TemplateSchema::Node(node) => node
                .as_object()
                .map(|object| object.properties.len())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: TemplateSchema,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn new(id: TemplateId, name: impl Into<String>, schema: TemplateSchema) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            schema,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn key(&self) -> TemplateKey {
        match self.schema.kind() {
            TemplateKind::Fields => TemplateKey::Fields(self.id),
            TemplateKind::Schema => TemplateKey::Schema(self.id),
        }
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            key: self.key(),
            name: self.name.clone(),
            description: self.description.clone(),
            field_count: self.schema.field_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub key: TemplateKey,
    pub name: String,
    pub description: Option<String>,
    pub field_count: usize,
}
