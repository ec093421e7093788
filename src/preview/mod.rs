//! HTML preview of the bound data, published through `data:` URL handles.

mod html;
mod render;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::Template;

pub use render::{error_document, render_document, render_flat, render_tree};

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Opaque reference to a published preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub id: u64,
    pub url: String,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: BTreeSet<u64>,
}

/// Tracks which preview handles are alive. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn allocate(&self, markup: &str) -> PreviewHandle {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.live.insert(id);
        PreviewHandle {
            id,
            url: format!(
                "data:text/html;charset=utf-8,{}",
                utf8_percent_encode(markup, NON_ALPHANUMERIC)
            ),
        }
    }

    pub fn release(&self, handle: &PreviewHandle) -> bool {
        self.lock().live.remove(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDocument {
    pub markup: String,
    pub handle: PreviewHandle,
    /// The markup is the static error block.
    pub failed: bool,
}

/// Holds the current preview and guarantees at most one live handle.
#[derive(Debug)]
pub struct PreviewSurface {
    registry: HandleRegistry,
    current: Option<PreviewDocument>,
    max_depth: usize,
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new(HandleRegistry::new())
    }
}

impl PreviewSurface {
    pub fn new(registry: HandleRegistry) -> Self {
        Self {
            registry,
            current: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn current(&self) -> Option<&PreviewDocument> {
        self.current.as_ref()
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Regenerate from scratch. The previous handle is released first, even when rendering fails.
    pub fn refresh(&mut self, template: &Template, data: &Value) -> &PreviewDocument {
        self.release_current();
        let now = Utc::now();
        let (markup, failed) = match render_document(template, data, now, self.max_depth) {
            Ok(markup) => (markup, false),
            Err(error) => {
                warn!(template = %template.name, %error, "preview render failed");
                (error_document(&template.name, now), true)
            }
        };
        let handle = self.registry.allocate(&markup);
        debug!(handle = handle.id, failed, "preview refreshed");
        self.current.insert(PreviewDocument {
            markup,
            handle,
            failed,
        })
    }

    pub fn clear(&mut self) {
        self.release_current();
    }

    fn release_current(&mut self) {
        if let Some(previous) = self.current.take() {
            self.registry.release(&previous.handle);
        }
    }
}

impl Drop for PreviewSurface {
    fn drop(&mut self) {
        self.release_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldSpec, ScalarKind, TemplateSchema};
    use serde_json::json;

    fn flat() -> Template {
        Template::new(
            1,
            "Contratto",
            TemplateSchema::Fields(vec![FieldSpec::new("nome", "Nome", ScalarKind::Text)]),
        )
    }

    #[test]
    fn keeps_a_single_live_handle() {
        let registry = HandleRegistry::new();
        let mut surface = PreviewSurface::new(registry.clone());
        let first = surface.refresh(&flat(), &json!({"nome": "Mario"})).handle.clone();
        let second = surface.refresh(&flat(), &json!({"nome": "Luigi"})).handle.clone();
        assert_ne!(first.id, second.id);
        assert_eq!(registry.live_count(), 1);
        assert!(!registry.release(&first));
        drop(surface);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn failed_render_still_rotates_handles() {
        let registry = HandleRegistry::new();
        let mut surface = PreviewSurface::new(registry.clone());
        surface.refresh(&flat(), &json!({"nome": "Mario"}));
        let document = surface.refresh(&flat(), &json!("not a map"));
        assert!(document.failed);
        assert!(document.markup.contains("preview-error"));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn handle_urls_are_percent_encoded() {
        let registry = HandleRegistry::new();
        let handle = registry.allocate("<p>a b</p>");
        assert!(handle.url.starts_with("data:text/html;charset=utf-8,"));
        assert!(handle.url.ends_with("%3Cp%3Ea%20b%3C%2Fp%3E"));
    }
}
