#![deny(rust_2018_idioms)]

mod binder;
mod domain;
mod error;
mod export;
mod form;
mod options;
mod path;
mod preview;
mod sample;
mod session;
mod store;

pub mod io;
pub mod schema;

pub use binder::FormDataStore;
pub use domain::{
    ArrayNode, FieldSpec, FlatField, FlatFieldKind, ObjectNode, ScalarKind, ScalarNode,
    SchemaNode, SelectOption, Template, TemplateId, TemplateKey, TemplateKind, TemplateSchema,
    TemplateSummary,
};
pub use error::{DocError, DocResult, RenderError, ValidationError};
pub use export::{
    DocumentService, ExportArtifact, ExportRequest, Exporter, JSON_MEDIA_TYPE, NoRemoteService,
    TEXT_MEDIA_TYPE, artifact_file_name, render_text,
};
pub use form::{
    ArrayControl, ControlNode, FormState, GroupControl, InputControl, ItemGroup, Widget, render,
    render_fields, render_item, render_template,
};
pub use options::SessionOptions;
pub use path::{FieldPath, MAX_ITEMS, MAX_PATH_DEPTH, PathError, Segment};
pub use preview::{
    DEFAULT_MAX_DEPTH, HandleRegistry, PreviewDocument, PreviewHandle, PreviewSurface,
    error_document, render_document, render_flat, render_tree,
};
pub use sample::{
    SampleGenerator, generate_sample, import_and_validate, import_fields, import_for_template,
};
pub use session::DocumentSession;
pub use store::{DirectoryTemplateStore, MemoryTemplateStore, TemplateStore};

pub mod prelude {
    pub use super::{
        DocError, DocumentSession, FieldPath, MemoryTemplateStore, SessionOptions, Template,
        TemplateKey, TemplateStore,
    };
}
