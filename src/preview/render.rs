use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{FieldSpec, SchemaNode, Template, TemplateSchema};
use crate::error::RenderError;
use crate::form::convert::value_to_string;
use crate::schema::prettify_label;

use super::html::{HtmlWriter, escape};

const STYLE: &str = "body{font-family:serif;margin:2em}\
section{margin:1em 0}.item{margin-left:1.5em}\
.label{font-weight:bold}footer{margin-top:2em;font-size:.8em;color:#666}\
.preview-error{color:#a00}";

/// Full preview document for `template` filled with `data`.
pub fn render_document(
    template: &Template,
    data: &Value,
    generated_at: DateTime<Utc>,
    max_depth: usize,
) -> Result<String, RenderError> {
    let body = match &template.schema {
        TemplateSchema::Fields(fields) => render_flat(fields, data)?,
        TemplateSchema::Node(node) => render_tree(node, data, max_depth)?,
    };
    Ok(wrap(&template.name, &body, generated_at))
}

/// Static document shown in place of a preview that could not be rendered.
pub fn error_document(name: &str, generated_at: DateTime<Utc>) -> String {
    let mut html = HtmlWriter::new();
    html.open("div", Some("preview-error"))
        .element("h2", None, "Preview unavailable")
        .element(
            "p",
            None,
            "The document could not be rendered from the current data.",
        )
        .close("div");
    wrap(name, &html.finish(), generated_at)
}

/// Flat templates: every field in order, missing values render empty.
pub fn render_flat(fields: &[FieldSpec], data: &Value) -> Result<String, RenderError> {
    let map = data
        .as_object()
        .ok_or(RenderError::NotAMapping("preview data"))?;
    let mut html = HtmlWriter::new();
    html.open("div", Some("fields"));
    for field in fields {
        let value = map.get(&field.name).map(value_to_string).unwrap_or_default();
        html.field(&field.label, &value);
    }
    html.close("div");
    Ok(html.finish())
}

/// Schema templates: the data's own key structure drives the layout, the schema only supplies labels.
pub fn render_tree(schema: &SchemaNode, data: &Value, max_depth: usize) -> Result<String, RenderError> {
    let map = data
        .as_object()
        .ok_or(RenderError::NotAMapping("preview data"))?;
    let mut html = HtmlWriter::new();
    write_map(&mut html, map, Some(schema), 0, max_depth)?;
    Ok(html.finish())
}

fn write_map(
    html: &mut HtmlWriter,
    map: &Map<String, Value>,
    schema: Option<&SchemaNode>,
    depth: usize,
    max_depth: usize,
) -> Result<(), RenderError> {
    if depth > max_depth {
        return Err(RenderError::TooDeep(max_depth));
    }
    for (key, value) in map {
        let node = schema.and_then(|schema| schema.child(key));
        let label = node
            .and_then(SchemaNode::label)
            .map(str::to_string)
            .unwrap_or_else(|| prettify_label(key));
        write_entry(html, &label, value, node, depth, max_depth)?;
    }
    Ok(())
}

fn write_entry(
    html: &mut HtmlWriter,
    label: &str,
    value: &Value,
    node: Option<&SchemaNode>,
    depth: usize,
    max_depth: usize,
) -> Result<(), RenderError> {
    if depth > max_depth {
        return Err(RenderError::TooDeep(max_depth));
    }
    let heading = heading_tag(depth);
    match value {
        Value::Object(map) => {
            html.open("section", None).element(heading, None, label);
            write_map(html, map, node, depth + 1, max_depth)?;
            html.close("section");
        }
        Value::Array(items) => {
            html.open("section", None).element(heading, None, label);
            let item_schema = node.and_then(SchemaNode::item);
            for (index, item) in items.iter().enumerate() {
                html.open("div", Some("item"))
                    .element(heading_tag(depth + 1), None, &format!("Item {}", index + 1));
                match item {
                    Value::Object(map) => write_map(html, map, item_schema, depth + 2, max_depth)?,
                    Value::Array(_) => {
                        write_entry(html, label, item, item_schema, depth + 2, max_depth)?
                    }
                    scalar => {
                        let item_label = item_schema
                            .and_then(SchemaNode::label)
                            .unwrap_or("Value");
                        html.field(item_label, &value_to_string(scalar));
                    }
                }
                html.close("div");
            }
            html.close("section");
        }
        scalar => {
            html.field(label, &value_to_string(scalar));
        }
    }
    Ok(())
}

fn heading_tag(depth: usize) -> &'static str {
    match depth {
        0 => "h2",
        1 => "h3",
        2 => "h4",
        3 => "h5",
        _ => "h6",
    }
}

fn wrap(name: &str, body: &str, generated_at: DateTime<Utc>) -> String {
    let title = escape(name);
    let stamp = generated_at.format("%Y-%m-%d %H:%M:%S UTC");
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<header><h1>{title}</h1></header>\n\
         <main>{body}</main>\n<footer>Generated on {stamp}</footer>\n</body>\n</html>\n"
    )
}
