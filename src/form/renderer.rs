use crate::domain::{FieldSpec, SchemaNode, Template, TemplateSchema};
use crate::path::{FieldPath, Segment};
use crate::schema::prettify_label;

use super::control::{ArrayControl, ControlNode, GroupControl, InputControl, ItemGroup};

const SCALAR_ITEM_LABEL: &str = "Value";

/// Build the control tree for `schema` mounted at `prefix`.
pub fn render(schema: &SchemaNode, prefix: &FieldPath) -> ControlNode {
    let label = schema
        .label()
        .map(str::to_string)
        .unwrap_or_else(|| fallback_label(prefix));
    match schema {
        SchemaNode::Object(object) => ControlNode::Group(GroupControl {
            path: prefix.clone(),
            label,
            children: object
                .properties
                .iter()
                .map(|(key, child)| render(child, &prefix.key(key)))
                .collect(),
        }),
        SchemaNode::Array(array) => ControlNode::Array(ArrayControl {
            path: prefix.clone(),
            label,
            item_schema: array.item.as_ref().clone(),
            min_items: array.min_items,
            items: (0..array.min_items)
                .map(|index| render_item(&array.item, prefix, index))
                .collect(),
        }),
        SchemaNode::Scalar(scalar) => ControlNode::Input(InputControl {
            path: prefix.clone(),
            label,
            kind: scalar.kind,
            required: scalar.required,
            placeholder: scalar.placeholder.clone(),
            options: scalar.options.clone(),
            value: String::new(),
        }),
    }
}

/// One item group of an array at `array_path[index]`.
pub fn render_item(item: &SchemaNode, array_path: &FieldPath, index: usize) -> ItemGroup {
    let path = array_path.index(index);
    let children = match item {
        SchemaNode::Object(object) => object
            .properties
            .iter()
            .map(|(key, child)| render(child, &path.key(key)))
            .collect(),
        SchemaNode::Scalar(_) => {
            let mut input = render(item, &path);
            if let ControlNode::Input(control) = &mut input
                && item.label().is_none()
            {
                control.label = SCALAR_ITEM_LABEL.to_string();
            }
            vec![input]
        }
        SchemaNode::Array(_) => vec![render(item, &path)],
    };
    ItemGroup {
        index,
        path,
        children,
    }
}

/// Flat templates: one input per field, addressed by the field name.
pub fn render_fields(label: &str, fields: &[FieldSpec]) -> ControlNode {
    ControlNode::Group(GroupControl {
        path: FieldPath::root(),
        label: label.to_string(),
        children: fields
            .iter()
            .map(|field| {
                ControlNode::Input(InputControl {
                    path: FieldPath::root().key(&field.name),
                    label: field.label.clone(),
                    kind: field.kind,
                    required: field.required,
                    placeholder: field.placeholder.clone(),
                    options: field.options.clone(),
                    value: String::new(),
                })
            })
            .collect(),
    })
}

pub fn render_template(template: &Template) -> ControlNode {
    match &template.schema {
        TemplateSchema::Fields(fields) => render_fields(&template.name, fields),
        TemplateSchema::Node(node) => {
            let mut root = render(node, &FieldPath::root());
            if let ControlNode::Group(group) = &mut root
                && node.label().is_none()
            {
                group.label = template.name.clone();
            }
            root
        }
    }
}

fn fallback_label(path: &FieldPath) -> String {
    match path.last() {
        Some(Segment::Key(name)) => prettify_label(name),
        Some(Segment::Index(_)) => SCALAR_ITEM_LABEL.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScalarKind;

    fn tags_schema() -> SchemaNode {
        SchemaNode::object(
            None,
            [(
                "tags",
                SchemaNode::array(
                    "Tags",
                    2,
                    SchemaNode::Scalar(crate::domain::ScalarNode {
                        kind: ScalarKind::Text,
                        label: None,
                        required: false,
                        placeholder: None,
                        options: Vec::new(),
                    }),
                ),
            )],
        )
    }

    #[test]
    fn prepopulates_min_items() {
        let root = render(&tags_schema(), &FieldPath::root());
        let array = root
            .find_array(&FieldPath::root().key("tags"))
            .expect("tags array");
        assert_eq!(array.items.len(), 2);
        let ControlNode::Input(input) = &array.items[1].children[0] else {
            panic!("scalar item renders an input");
        };
        assert_eq!(input.path.to_string(), "tags[1]");
        assert_eq!(input.label, "Value");
    }

    #[test]
    fn object_items_hold_properties_directly() {
        let schema = SchemaNode::array(
            "Destinatari",
            1,
            SchemaNode::object(
                None,
                [
                    ("ufficio", SchemaNode::scalar(ScalarKind::Text, "Ufficio")),
                    ("localita", SchemaNode::scalar(ScalarKind::Text, "Località")),
                ],
            ),
        );
        let item_schema = schema.item().expect("item schema");
        let item = render_item(item_schema, &FieldPath::root().key("destinatari"), 0);
        let paths: Vec<_> = item
            .children
            .iter()
            .map(|child| child.path().to_string())
            .collect();
        assert_eq!(paths, ["destinatari[0].ufficio", "destinatari[0].localita"]);
    }

    #[test]
    fn unlabelled_properties_fall_back_to_key() {
        let schema = SchemaNode::object(
            None,
            [(
                "data_inizio",
                SchemaNode::Scalar(crate::domain::ScalarNode {
                    kind: ScalarKind::Date,
                    label: None,
                    required: true,
                    placeholder: None,
                    options: Vec::new(),
                }),
            )],
        );
        let root = render(&schema, &FieldPath::root());
        let input = root
            .find_input(&FieldPath::root().key("data_inizio"))
            .expect("input");
        assert_eq!(input.label, "Data Inizio");
        assert!(input.required);
    }
}
