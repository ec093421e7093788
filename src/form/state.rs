use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::Template;
use crate::error::{DocError, DocResult};
use crate::path::{FieldPath, MAX_ITEMS};

use super::control::{ArrayControl, ControlNode, InputControl};
use super::convert::value_to_string;
use super::renderer::{render_item, render_template};

/// Mounted control tree for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    root: ControlNode,
}

impl FormState {
    pub fn from_template(template: &Template) -> Self {
        Self {
            root: render_template(template),
        }
    }

    pub fn from_root(root: ControlNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &ControlNode {
        &self.root
    }

    pub fn array(&self, path: &FieldPath) -> Option<&ArrayControl> {
        self.root.find_array(path)
    }

    pub fn input(&self, path: &FieldPath) -> Option<&InputControl> {
        self.root.find_input(path)
    }

    /// Append an item group at the end of the array. Existing items keep their indices.
    pub fn add_item(&mut self, array_path: &FieldPath) -> DocResult<FieldPath> {
        let array = self
            .root
            .find_array_mut(array_path)
            .ok_or_else(|| DocError::UnknownArray(array_path.to_string()))?;
        let index = array.items.len();
        if index >= MAX_ITEMS {
            return Err(DocError::ItemOutOfRange {
                path: array_path.to_string(),
                index,
                len: index,
            });
        }
        let item = render_item(&array.item_schema, array_path, index);
        let path = item.path.clone();
        array.items.push(item);
        debug!(array = %array_path, index, "added array item");
        Ok(path)
    }

    /// Detach the item at `index` and renumber the items after it so indices stay contiguous.
    pub fn remove_item(&mut self, array_path: &FieldPath, index: usize) -> DocResult<()> {
        let array = self
            .root
            .find_array_mut(array_path)
            .ok_or_else(|| DocError::UnknownArray(array_path.to_string()))?;
        let len = array.items.len();
        if index >= len {
            return Err(DocError::ItemOutOfRange {
                path: array_path.to_string(),
                index,
                len,
            });
        }
        array.items.remove(index);
        let depth = array_path.len();
        for (position, item) in array.items.iter_mut().enumerate().skip(index) {
            item.index = position;
            item.rebase(depth, position);
        }
        debug!(array = %array_path, index, remaining = len - 1, "removed array item");
        Ok(())
    }

    /// Store the raw value on the input at `path`. Returns false when no such input is mounted.
    pub fn set_input(&mut self, path: &FieldPath, value: &str) -> bool {
        match self.root.find_input_mut(path) {
            Some(input) => {
                input.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn inputs(&self) -> Vec<&InputControl> {
        let mut inputs = Vec::new();
        self.root.for_each_input(&mut |input| inputs.push(input));
        inputs
    }

    pub fn input_paths(&self) -> Vec<String> {
        self.inputs()
            .into_iter()
            .map(|input| input.path.to_string())
            .collect()
    }

    /// One-level map of `path string -> value` over every mounted input.
    pub fn flat_values(&self) -> Map<String, Value> {
        self.inputs()
            .into_iter()
            .map(|input| (input.path.to_string(), Value::String(input.value.clone())))
            .collect()
    }

    /// Resize arrays to the sequences found in `data` and copy its values into the inputs.
    /// Inputs with no value in `data` are cleared.
    pub fn seed_from_value(&mut self, data: &Value) {
        seed_node(&mut self.root, data);
    }
}

fn seed_node(node: &mut ControlNode, data: &Value) {
    match node {
        ControlNode::Input(input) => {
            input.value = input
                .path
                .lookup(data)
                .map(value_to_string)
                .unwrap_or_default();
        }
        ControlNode::Group(group) => {
            for child in &mut group.children {
                seed_node(child, data);
            }
        }
        ControlNode::Array(array) => {
            if let Some(Value::Array(values)) = array.path.lookup(data) {
                if values.len() > MAX_ITEMS {
                    warn!(array = %array.path, len = values.len(), "mounting only the first {MAX_ITEMS} items");
                }
                array.items = (0..values.len().min(MAX_ITEMS))
                    .map(|index| render_item(&array.item_schema, &array.path, index))
                    .collect();
            }
            for child in array.items.iter_mut().flat_map(|item| item.children.iter_mut()) {
                seed_node(child, data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldSpec, ScalarKind, SchemaNode, TemplateSchema};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn letter() -> Template {
        let schema = SchemaNode::object(
            None,
            [
                (
                    "destinatari",
                    SchemaNode::array(
                        "Destinatari",
                        1,
                        SchemaNode::object(
                            None,
                            [
                                ("ufficio", SchemaNode::scalar(ScalarKind::Text, "Ufficio")),
                                ("localita", SchemaNode::scalar(ScalarKind::Text, "Località")),
                            ],
                        ),
                    ),
                ),
                ("oggetto", SchemaNode::scalar(ScalarKind::Textarea, "Oggetto")),
            ],
        );
        Template::new(1, "Lettera", TemplateSchema::Node(schema))
    }

    fn destinatari() -> FieldPath {
        FieldPath::root().key("destinatari")
    }

    #[test]
    fn add_item_appends_at_current_count() {
        let mut form = FormState::from_template(&letter());
        let added = form.add_item(&destinatari()).expect("add");
        assert_eq!(added.to_string(), "destinatari[1]");
        assert!(form.input(&added.key("ufficio")).is_some());
    }

    #[test]
    fn add_item_stops_at_the_item_limit() {
        let mut form = FormState::from_template(&letter());
        for _ in 1..MAX_ITEMS {
            form.add_item(&destinatari()).expect("add");
        }
        assert!(matches!(
            form.add_item(&destinatari()),
            Err(DocError::ItemOutOfRange { index, .. }) if index == MAX_ITEMS
        ));
        assert_eq!(form.array(&destinatari()).expect("array").items.len(), MAX_ITEMS);
    }

    #[test]
    fn seeding_mounts_at_most_the_item_limit() {
        let mut form = FormState::from_template(&letter());
        let many: Vec<_> = (0..MAX_ITEMS + 5).map(|_| json!({"ufficio": "X"})).collect();
        form.seed_from_value(&json!({"destinatari": many}));
        assert_eq!(form.array(&destinatari()).expect("array").items.len(), MAX_ITEMS);
    }

    #[test]
    fn remove_item_renumbers_later_siblings() {
        let mut form = FormState::from_template(&letter());
        form.add_item(&destinatari()).expect("add");
        form.add_item(&destinatari()).expect("add");
        let third = FieldPath::parse("destinatari[2].ufficio").expect("path");
        assert!(form.set_input(&third, "Comando"));

        form.remove_item(&destinatari(), 1).expect("remove");

        assert_eq!(
            form.input_paths(),
            vec![
                "destinatari[0].ufficio",
                "destinatari[0].localita",
                "destinatari[1].ufficio",
                "destinatari[1].localita",
                "oggetto",
            ]
        );
        let moved = FieldPath::parse("destinatari[1].ufficio").expect("path");
        assert_eq!(form.input(&moved).map(|input| input.value.as_str()), Some("Comando"));
        let indices: Vec<_> = form
            .array(&destinatari())
            .expect("array")
            .items
            .iter()
            .map(|item| item.index)
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn remove_item_rejects_bad_targets() {
        let mut form = FormState::from_template(&letter());
        assert!(matches!(
            form.remove_item(&destinatari(), 3),
            Err(DocError::ItemOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(matches!(
            form.add_item(&FieldPath::root().key("oggetto")),
            Err(DocError::UnknownArray(_))
        ));
    }

    #[test]
    fn seeds_arrays_and_values_from_data() {
        let mut form = FormState::from_template(&letter());
        form.seed_from_value(&json!({
            "destinatari": [
                {"ufficio": "A", "localita": "Roma"},
                {"ufficio": "B"},
                {"ufficio": "C"}
            ],
            "oggetto": "Prova"
        }));
        let array = form.array(&destinatari()).expect("array");
        assert_eq!(array.items.len(), 3);
        let localita = FieldPath::parse("destinatari[1].localita").expect("path");
        assert_eq!(form.input(&localita).map(|input| input.value.as_str()), Some(""));
        let oggetto = FieldPath::root().key("oggetto");
        assert_eq!(form.input(&oggetto).map(|input| input.value.as_str()), Some("Prova"));
    }

    #[test]
    fn flat_templates_expose_field_names() {
        let template = Template::new(
            2,
            "Contratto",
            TemplateSchema::Fields(vec![
                FieldSpec::new("nome", "Nome", ScalarKind::Text),
                FieldSpec::new("stipendio", "Stipendio", ScalarKind::Number),
            ]),
        );
        let mut form = FormState::from_template(&template);
        form.set_input(&FieldPath::root().key("nome"), "Mario");
        assert_eq!(
            Value::Object(form.flat_values()),
            json!({"nome": "Mario", "stipendio": ""})
        );
    }
}
