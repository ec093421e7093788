use docgen::{
    ControlNode, DocError, FieldPath, FieldSpec, FormDataStore, MemoryTemplateStore,
    SampleGenerator, ScalarKind, TemplateStore, ValidationError, generate_sample,
    import_and_validate, import_fields, render_flat, render_template,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn builtin() -> MemoryTemplateStore {
    MemoryTemplateStore::builtin().expect("builtin templates parse")
}

fn collect_paths(node: &ControlNode, acc: &mut Vec<String>) {
    match node {
        ControlNode::Group(group) => {
            if !group.path.is_root() {
                acc.push(group.path.to_string());
            }
            for child in &group.children {
                collect_paths(child, acc);
            }
        }
        ControlNode::Array(array) => {
            acc.push(array.path.to_string());
            for item in &array.items {
                acc.push(item.path.to_string());
                for child in &item.children {
                    collect_paths(child, acc);
                }
            }
        }
        ControlNode::Input(input) => acc.push(input.path.to_string()),
    }
}

#[test]
fn renderer_paths_round_trip() {
    let store = builtin();
    for summary in store.list_templates() {
        let template = store.get(summary.key).expect("listed template");
        let mut paths = Vec::new();
        collect_paths(&render_template(&template), &mut paths);
        assert!(!paths.is_empty(), "{} rendered no controls", template.name);
        for path in paths {
            let parsed = FieldPath::parse(&path).expect("renderer path parses");
            assert_eq!(parsed.to_string(), path);
            assert!(FieldPath::is_canonical(&path), "{path} is not canonical");
        }
    }
}

#[test]
fn samples_pass_their_own_import_check() {
    let store = builtin();
    let samples = SampleGenerator::new();
    for summary in store.list_templates() {
        let template = store.get(summary.key).expect("listed template");
        let sample = samples.generate_template(&template);
        let text = serde_json::to_string(&sample).expect("sample serializes");
        let imported = match template.schema.as_node() {
            Some(node) => {
                assert!(generate_sample(node).is_object());
                import_and_validate(&text, node)
            }
            None => import_fields(&text, template.schema.fields()),
        };
        assert_eq!(imported.expect("sample imports"), sample, "{}", template.name);
    }
}

#[test]
fn dotted_and_indexed_paths_bind_into_nested_data() {
    let mut store = FormDataStore::new();
    for (path, value) in [("a.b", "1"), ("a.c", "2"), ("x[0].y", "3"), ("x[1].y", "4")] {
        store.set_value(path, value).expect("valid path");
    }
    assert_eq!(
        store.data(),
        &json!({"a": {"b": "1", "c": "2"}, "x": [{"y": "3"}, {"y": "4"}]})
    );
}

#[test]
fn military_letter_import_names_the_missing_key() {
    let store = builtin();
    let letter = store.find_by_name("Lettera Militare").expect("letter");
    let node = letter.schema.as_node().expect("schema template");
    let err = import_and_validate(r#"{"oggetto":"test"}"#, node).expect_err("pdc is required");
    match err {
        DocError::Validation(ValidationError::MissingRequired { key, .. }) => {
            assert_eq!(key, "pdc")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn flat_preview_puts_label_before_value() {
    let fields = [FieldSpec::new("nome", "Nome", ScalarKind::Text)];
    let markup = render_flat(&fields, &json!({"nome": "Mario"})).expect("renders");
    let label = markup.find("Nome").expect("label present");
    let value = markup.find("Mario").expect("value present");
    assert!(label < value);
}
