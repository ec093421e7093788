use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Template, TemplateId, TemplateKind, TemplateSummary};
use crate::error::{DocError, DocResult};
use crate::schema::parse_template_value;

use super::TemplateStore;

const BUILTIN_TEMPLATES: &[&str] = &[
    include_str!("../../templates/contratto_di_lavoro.json"),
    include_str!("../../templates/dichiarazione_dei_redditi.json"),
    include_str!("../../templates/lettera_militare.json"),
    include_str!("../../templates/richiesta_ferie.json"),
];

const BUILTIN_EXAMPLES: &[&str] = &[
    include_str!("../../templates/examples/lettera_militare.json"),
    include_str!("../../templates/examples/richiesta_ferie.json"),
];

/// Example document file: the data plus the name of the template it fills.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExampleDocument {
    pub template: String,
    pub data: Value,
}

/// In-process store. Flat and schema templates have separate id sequences starting at 1.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    fields: IndexMap<TemplateId, Template>,
    schemas: IndexMap<TemplateId, Template>,
    examples: IndexMap<String, Value>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the bundled templates and example documents.
    pub fn builtin() -> DocResult<Self> {
        let mut store = Self::new();
        for source in BUILTIN_TEMPLATES {
            let document: Value = serde_json::from_str(source)?;
            let template = parse_template_value(&document, 0)?;
            store.add(template);
        }
        for source in BUILTIN_EXAMPLES {
            let example: ExampleDocument = serde_json::from_str(source)?;
            store.add_example(example.template, example.data);
        }
        debug!(
            fields = store.fields.len(),
            schemas = store.schemas.len(),
            "loaded builtin templates"
        );
        Ok(store)
    }

    /// Insert under the next free id of the template's kind and return that id.
    pub fn add(&mut self, mut template: Template) -> TemplateId {
        let table = match template.schema.kind() {
            TemplateKind::Fields => &mut self.fields,
            TemplateKind::Schema => &mut self.schemas,
        };
        let id = table.keys().max().map_or(1, |max| max + 1);
        template.id = id;
        table.insert(id, template);
        id
    }

    pub fn add_example(&mut self, template_name: impl Into<String>, data: Value) {
        self.examples
            .insert(template_name.into().to_lowercase(), data);
    }

    pub fn remove(&mut self, kind: TemplateKind, id: TemplateId) -> DocResult<Template> {
        let table = match kind {
            TemplateKind::Fields => &mut self.fields,
            TemplateKind::Schema => &mut self.schemas,
        };
        table
            .shift_remove(&id)
            .ok_or_else(|| DocError::TemplateNotFound(format!("{kind:?}({id})")))
    }

    pub fn len(&self) -> usize {
        self.fields.len() + self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn get_template(&self, id: TemplateId) -> Option<Template> {
        self.fields.get(&id).cloned()
    }

    fn get_json_template(&self, id: TemplateId) -> Option<Template> {
        self.schemas.get(&id).cloned()
    }

    fn list_templates(&self) -> Vec<TemplateSummary> {
        self.fields
            .values()
            .chain(self.schemas.values())
            .map(Template::summary)
            .collect()
    }

    fn example(&self, template_name: &str) -> Option<Value> {
        self.examples.get(&template_name.to_lowercase()).cloned()
    }
}
