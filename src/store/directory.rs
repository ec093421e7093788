use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Template, TemplateId, TemplateSummary};
use crate::io::{DocumentFormat, parse_document_str};
use crate::schema::load_template_file;

use super::TemplateStore;
use super::memory::{ExampleDocument, MemoryTemplateStore};

const EXAMPLES_DIR: &str = "examples";

/// Templates read from `*.json` (and `*.yaml`/`*.toml` when enabled) files in a directory.
/// Example documents live in an `examples/` subdirectory.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
    inner: MemoryTemplateStore,
}

impl DirectoryTemplateStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_into(root, MemoryTemplateStore::new())
    }

    /// Load on top of an existing store, e.g. the builtin one.
    pub fn open_into(root: impl AsRef<Path>, mut inner: MemoryTemplateStore) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for path in document_paths(&root)? {
            let template = load_template_file(&path, 0)?;
            debug!(path = %path.display(), name = %template.name, "loaded template");
            inner.add(template);
        }

        let examples = root.join(EXAMPLES_DIR);
        if examples.is_dir() {
            for path in document_paths(&examples)? {
                match read_example(&path) {
                    Ok(example) => inner.add_example(example.template, example.data),
                    Err(error) => warn!(path = %path.display(), %error, "skipping example document"),
                }
            }
        }

        Ok(Self { root, inner })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn into_inner(self) -> MemoryTemplateStore {
        self.inner
    }
}

fn document_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read template directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_file() && DocumentFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_example(path: &Path) -> Result<ExampleDocument> {
    let format = DocumentFormat::from_path(path)
        .with_context(|| format!("unsupported format: {}", path.display()))?;
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = parse_document_str(&contents, format)?;
    serde_json::from_value(value).context("example must have `template` and `data` keys")
}

impl TemplateStore for DirectoryTemplateStore {
    fn get_template(&self, id: TemplateId) -> Option<Template> {
        self.inner.get_template(id)
    }

    fn get_json_template(&self, id: TemplateId) -> Option<Template> {
        self.inner.get_json_template(id)
    }

    fn list_templates(&self) -> Vec<TemplateSummary> {
        self.inner.list_templates()
    }

    fn example(&self, template_name: &str) -> Option<Value> {
        self.inner.example(template_name)
    }
}
