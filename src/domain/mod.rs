mod schema;
mod template;

pub use schema::{
    ArrayNode, FieldSpec, FlatField, FlatFieldKind, ObjectNode, ScalarKind, ScalarNode,
    SchemaNode, SelectOption,
};
pub use template::{
    Template, TemplateId, TemplateKey, TemplateKind, TemplateSchema, TemplateSummary,
};
