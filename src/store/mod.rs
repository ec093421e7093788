//! Template lookup. The session only depends on the `TemplateStore` trait.

mod directory;
mod memory;

use serde_json::Value;

use crate::domain::{Template, TemplateId, TemplateKey, TemplateSummary};
use crate::error::{DocError, DocResult};

pub use directory::DirectoryTemplateStore;
pub use memory::MemoryTemplateStore;

pub trait TemplateStore {
    /// Flat field-list template by id.
    fn get_template(&self, id: TemplateId) -> Option<Template>;

    /// Nested schema template by id.
    fn get_json_template(&self, id: TemplateId) -> Option<Template>;

    fn list_templates(&self) -> Vec<TemplateSummary>;

    /// Example document registered for a template name, if any.
    fn example(&self, _template_name: &str) -> Option<Value> {
        None
    }

    fn get(&self, key: TemplateKey) -> DocResult<Template> {
        let found = match key {
            TemplateKey::Fields(id) => self.get_template(id),
            TemplateKey::Schema(id) => self.get_json_template(id),
        };
        found.ok_or_else(|| DocError::TemplateNotFound(format!("{key:?}")))
    }

    /// Case-insensitive name lookup. Schema templates win over flat ones with the same name.
    fn find_by_name(&self, name: &str) -> DocResult<Template> {
        let mut candidates: Vec<_> = self
            .list_templates()
            .into_iter()
            .filter(|summary| summary.name.eq_ignore_ascii_case(name.trim()))
            .collect();
        candidates.sort_by_key(|summary| matches!(summary.key, TemplateKey::Fields(_)));
        match candidates.first() {
            Some(summary) => self.get(summary.key),
            None => Err(DocError::TemplateNotFound(name.to_string())),
        }
    }
}
