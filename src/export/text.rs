use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use textwrap::Options;
use unicode_width::UnicodeWidthStr;

use crate::domain::{FieldSpec, SchemaNode, Template, TemplateSchema};
use crate::form::convert::value_to_string;
use crate::preview::DEFAULT_MAX_DEPTH;
use crate::schema::prettify_label;

const INDENT: &str = "  ";

/// Plain-text rendition of a filled template, used when no document service is available.
pub fn render_text(
    template: &Template,
    data: &Value,
    created_at: DateTime<Utc>,
    wrap_width: usize,
) -> String {
    let mut out = format!("{}\n\n", template.name);
    match &template.schema {
        TemplateSchema::Fields(fields) => write_fields(&mut out, fields, data, wrap_width),
        TemplateSchema::Node(node) => match data {
            Value::Object(map) => write_map(&mut out, map, Some(node), 0, wrap_width),
            other => push_line(&mut out, "", "Data", &value_to_string(other), wrap_width),
        },
    }
    out.push_str(&format!("\nCreated on {}\n", created_at.format("%Y-%m-%d")));
    out
}

fn write_fields(out: &mut String, fields: &[FieldSpec], data: &Value, wrap_width: usize) {
    let lookup = data.as_object();
    for field in fields {
        let value = lookup
            .and_then(|map| map.get(&field.name))
            .map(value_to_string)
            .unwrap_or_default();
        push_line(out, "", &field.label, &value, wrap_width);
    }
    // Data bound under names the template does not declare still gets exported.
    if let Some(map) = lookup {
        for (key, value) in map {
            if !fields.iter().any(|field| &field.name == key) {
                push_line(out, "", key, &value_to_string(value), wrap_width);
            }
        }
    }
}

fn write_map(
    out: &mut String,
    map: &Map<String, Value>,
    schema: Option<&SchemaNode>,
    depth: usize,
    wrap_width: usize,
) {
    let indent = INDENT.repeat(depth);
    if depth > DEFAULT_MAX_DEPTH {
        out.push_str(&format!("{indent}(nested too deep)\n"));
        return;
    }
    for (key, value) in map {
        let node = schema.and_then(|schema| schema.child(key));
        let label = node
            .and_then(SchemaNode::label)
            .map(str::to_string)
            .unwrap_or_else(|| prettify_label(key));
        match value {
            Value::Object(child) => {
                out.push_str(&format!("{indent}{label}:\n"));
                write_map(out, child, node, depth + 1, wrap_width);
            }
            Value::Array(items) => {
                out.push_str(&format!("{indent}{label}:\n"));
                write_items(out, items, node.and_then(SchemaNode::item), depth + 1, wrap_width);
            }
            scalar => push_line(out, &indent, &label, &value_to_string(scalar), wrap_width),
        }
    }
}

fn write_items(
    out: &mut String,
    items: &[Value],
    item_schema: Option<&SchemaNode>,
    depth: usize,
    wrap_width: usize,
) {
    let indent = INDENT.repeat(depth);
    if depth > DEFAULT_MAX_DEPTH {
        out.push_str(&format!("{indent}(nested too deep)\n"));
        return;
    }
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("{indent}Item {}:\n", index + 1));
        match item {
            Value::Object(map) => write_map(out, map, item_schema, depth + 1, wrap_width),
            Value::Array(nested) => write_items(
                out,
                nested,
                item_schema.and_then(SchemaNode::item),
                depth + 1,
                wrap_width,
            ),
            scalar => {
                let label = item_schema.and_then(SchemaNode::label).unwrap_or("Value");
                let inner = INDENT.repeat(depth + 1);
                push_line(out, &inner, label, &value_to_string(scalar), wrap_width);
            }
        }
    }
}

/// `label: value`, wrapped so continuation lines align under the value.
fn push_line(out: &mut String, indent: &str, label: &str, value: &str, wrap_width: usize) {
    let head = format!("{indent}{label}: ");
    if value.is_empty() {
        out.push_str(head.trim_end());
        out.push('\n');
        return;
    }
    let hanging = " ".repeat(head.width());
    let options = Options::new(wrap_width.max(head.width() + 1))
        .initial_indent(&head)
        .subsequent_indent(&hanging);
    out.push_str(&textwrap::fill(value, options));
    out.push('\n');
}
