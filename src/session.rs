//! One open document: template, mounted controls, bound data and live preview.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::binder::FormDataStore;
use crate::domain::{Template, TemplateKey};
use crate::error::{DocError, DocResult};
use crate::export::{DocumentService, ExportArtifact, Exporter, NoRemoteService};
use crate::form::FormState;
use crate::options::SessionOptions;
use crate::path::FieldPath;
use crate::preview::{HandleRegistry, PreviewDocument, PreviewSurface};
use crate::sample::{SampleGenerator, import_for_template};
use crate::store::TemplateStore;

#[derive(Debug)]
pub struct DocumentSession {
    template: Template,
    form: FormState,
    data: FormDataStore,
    changes: watch::Receiver<u64>,
    preview: PreviewSurface,
    exporter: Exporter,
    samples: SampleGenerator,
    options: SessionOptions,
}

impl DocumentSession {
    pub fn new(template: Template, options: SessionOptions) -> Self {
        Self::with_parts(
            template,
            options,
            HandleRegistry::new(),
            Arc::new(NoRemoteService),
        )
    }

    /// Full constructor: preview handles come from `registry`, exports go to `service`.
    pub fn with_parts(
        template: Template,
        options: SessionOptions,
        registry: HandleRegistry,
        service: Arc<dyn DocumentService>,
    ) -> Self {
        let data = FormDataStore::new();
        let changes = data.subscribe();
        let preview = PreviewSurface::new(registry).with_max_depth(options.max_preview_depth);
        let exporter = Exporter::new(service)
            .with_delay(options.export_delay)
            .with_wrap_width(options.wrap_width);
        let mut session = Self {
            form: FormState::from_template(&template),
            template,
            data,
            changes,
            preview,
            exporter,
            samples: SampleGenerator::new(),
            options,
        };
        session.refresh_preview();
        info!(template = %session.template.name, "opened session");
        session
    }

    pub fn open(
        store: &impl TemplateStore,
        key: TemplateKey,
        options: SessionOptions,
    ) -> DocResult<Self> {
        Ok(Self::new(store.get(key)?, options))
    }

    pub fn with_samples(mut self, samples: SampleGenerator) -> Self {
        self.samples = samples;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn data(&self) -> &Value {
        self.data.data()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Replace the template: controls are re-rendered and the data starts empty.
    pub fn switch_template(&mut self, template: Template) {
        info!(from = %self.template.name, to = %template.name, "switching template");
        self.form = FormState::from_template(&template);
        self.template = template;
        self.data.reset();
        self.sync_preview();
    }

    /// A value change on the control at `path`.
    pub fn input(&mut self, path: &str, raw: &str) -> DocResult<()> {
        let path = self.data.set_value(path, raw)?;
        if !self.form.set_input(&path, raw) {
            let mismatch = DocError::SchemaMismatch {
                path: path.to_string(),
                reason: "no mounted control".to_string(),
            };
            warn!(%mismatch, "bound value without a control");
        }
        self.sync_preview();
        Ok(())
    }

    pub fn add_item(&mut self, array_path: &str) -> DocResult<FieldPath> {
        let array_path = FieldPath::parse(array_path)?;
        let added = self.form.add_item(&array_path)?;
        self.data.mark_changed();
        self.sync_preview();
        Ok(added)
    }

    /// Remove an item from both the controls and the data, renumbering what follows.
    pub fn remove_item(&mut self, array_path: &str, index: usize) -> DocResult<()> {
        let array_path = FieldPath::parse(array_path)?;
        self.form.remove_item(&array_path, index)?;
        if !self.data.remove_index(&array_path, index) {
            // Nothing bound yet; the flat input scan still changed.
            self.data.mark_changed();
        }
        self.sync_preview();
        Ok(())
    }

    /// Validate `text` against the template and load it into controls and data.
    pub fn import_json(&mut self, text: &str) -> DocResult<()> {
        let value = import_for_template(text, &self.template)?;
        self.load_data(value);
        Ok(())
    }

    pub fn load_sample(&mut self) {
        let sample = self.samples.generate_template(&self.template);
        self.load_data(sample);
    }

    pub fn load_example(&mut self, store: &impl TemplateStore) -> DocResult<()> {
        let example = store.example(&self.template.name).ok_or_else(|| {
            DocError::TemplateNotFound(format!("no example document for {}", self.template.name))
        })?;
        self.load_data(example);
        Ok(())
    }

    fn load_data(&mut self, value: Value) {
        self.form.seed_from_value(&value);
        self.data.replace(value);
        self.sync_preview();
    }

    pub fn form_data(&self) -> Value {
        self.data.form_data(&self.form)
    }

    /// Regenerate the preview now, consuming any pending change notification.
    pub fn preview(&mut self) -> &PreviewDocument {
        drop(self.changes.borrow_and_update());
        let data = self.form_data();
        self.preview.refresh(&self.template, &data)
    }

    pub fn current_preview(&self) -> Option<&PreviewDocument> {
        self.preview.current()
    }

    pub async fn export(&self) -> DocResult<ExportArtifact> {
        self.exporter.export(&self.template, &self.form_data()).await
    }

    /// Export this session's data through each of `templates`, all or nothing.
    pub async fn export_package(&self, templates: &[Template]) -> DocResult<Vec<ExportArtifact>> {
        self.exporter
            .export_package(templates, &self.form_data())
            .await
    }

    pub fn export_json(&self) -> DocResult<ExportArtifact> {
        self.exporter.export_json(&self.template, &self.form_data())
    }

    /// Coalesce pending change notifications into a single refresh.
    fn sync_preview(&mut self) {
        if self.changes.has_changed().unwrap_or(true) {
            let revision = *self.changes.borrow_and_update();
            debug!(revision, "data changed");
            self.refresh_preview();
        }
    }

    fn refresh_preview(&mut self) {
        let data = self.form_data();
        self.preview.refresh(&self.template, &data);
    }
}
