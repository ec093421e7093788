use thiserror::Error;

use crate::path::PathError;

pub type DocResult<T> = Result<T, DocError>;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("schema mismatch at `{path}`: {reason}")]
    SchemaMismatch { path: String, reason: String },
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("invalid template schema: {0}")]
    InvalidSchema(String),
    #[error("no array control at `{0}`")]
    UnknownArray(String),
    #[error("item {index} out of range for `{path}` ({len} items)")]
    ItemOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("an export is already in progress")]
    ExportBusy,
    #[error("a document package needs at least one template")]
    EmptyPackage,
}

/// Shallow import check failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("imported data is not an object")]
    NotAMapping,
    #[error("missing required field: {label} (`{key}`)")]
    MissingRequired { key: String, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("{0} is not an object")]
    NotAMapping(&'static str),
    #[error("data nested deeper than {0} levels")]
    TooDeep(usize),
}
