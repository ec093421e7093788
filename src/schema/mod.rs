mod loader;
mod metadata;
mod raw;

pub use loader::{
    load_template_file, load_template_str, meta_schema, parse_schema_value, parse_template_value,
};
pub use metadata::prettify_label;
pub use raw::{RawField, RawKind, RawNode, RawOption, RawTemplate};
