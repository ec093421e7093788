mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{parse_document_str, read_source};
pub use output::{
    OutputDestination, OutputOptions, emit, write_artifact, write_text,
};
