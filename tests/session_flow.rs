use std::time::Duration;

use docgen::{
    DocError, DocumentSession, FieldPath, HandleRegistry, MemoryTemplateStore, NoRemoteService,
    SessionOptions, TemplateStore,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn store() -> MemoryTemplateStore {
    MemoryTemplateStore::builtin().expect("builtin templates parse")
}

fn letter_session() -> DocumentSession {
    let template = store().find_by_name("Lettera Militare").expect("letter");
    DocumentSession::new(template, SessionOptions::default())
}

fn input_value(session: &DocumentSession, path: &str) -> Option<String> {
    let path = FieldPath::parse(path).expect("path");
    session.form().input(&path).map(|input| input.value.clone())
}

#[test]
fn removing_the_middle_item_compacts_controls_and_data() {
    let mut session = letter_session();
    session.add_item("destinatari").expect("second item");
    session.add_item("destinatari").expect("third item");
    for (index, office) in ["A", "B", "C"].into_iter().enumerate() {
        session
            .input(&format!("destinatari[{index}].ufficio"), office)
            .expect("bind");
    }

    session.remove_item("destinatari", 1).expect("remove");

    assert_eq!(
        session.data()["destinatari"],
        json!([{"ufficio": "A"}, {"ufficio": "C"}])
    );
    assert_eq!(input_value(&session, "destinatari[1].ufficio").as_deref(), Some("C"));
    assert_eq!(input_value(&session, "destinatari[2].ufficio"), None);
    let preview = session.current_preview().expect("preview");
    assert!(preview.markup.contains("C"));
    assert!(!preview.failed);
}

#[test]
fn every_input_regenerates_the_preview() {
    let mut session = letter_session();
    session.input("oggetto", "Richiesta <urgente>").expect("bind");
    let markup = &session.current_preview().expect("preview").markup;
    assert!(markup.contains("Richiesta &lt;urgente&gt;"));

    session.input("oggetto", "Seconda versione").expect("bind");
    let markup = &session.current_preview().expect("preview").markup;
    assert!(markup.contains("Seconda versione"));
    assert!(!markup.contains("urgente"));
}

#[test]
fn preview_handles_never_accumulate() {
    let template = store().find_by_name("Richiesta Ferie").expect("leave request");
    let registry = HandleRegistry::new();
    {
        let mut session = DocumentSession::with_parts(
            template,
            SessionOptions::default(),
            registry.clone(),
            Arc::new(NoRemoteService),
        );
        for name in ["Mario", "Luigi", "Anna"] {
            session.input("dipendente.nome", name).expect("bind");
            assert_eq!(registry.live_count(), 1);
        }
        session.preview();
        assert_eq!(registry.live_count(), 1);
    }
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn malformed_paths_are_rejected() {
    let mut session = letter_session();
    assert!(matches!(
        session.input("destinatari[x].ufficio", "A"),
        Err(DocError::Path(_))
    ));
    assert!(matches!(
        session.remove_item("oggetto", 0),
        Err(DocError::UnknownArray(_))
    ));
}

#[test]
fn import_and_example_seed_the_form() {
    let store = store();
    let mut session = letter_session();
    assert!(session.import_json(r#"{"oggetto":"test"}"#).is_err());
    assert_eq!(session.data(), &json!({}));

    session.load_example(&store).expect("example");
    assert!(session.data()["pdc"].is_object());
    let items = session
        .form()
        .array(&FieldPath::parse("destinatari").expect("path"))
        .expect("array")
        .items
        .len();
    assert_eq!(
        items,
        session.data()["destinatari"].as_array().map_or(0, Vec::len)
    );
}

#[test]
fn switching_templates_starts_from_empty_data() {
    let store = store();
    let mut session = letter_session();
    session.input("oggetto", "Prova").expect("bind");
    let contract = store.find_by_name("Contratto di Lavoro").expect("contract");
    session.switch_template(contract);
    assert_eq!(session.template().name, "Contratto di Lavoro");
    assert_eq!(session.data(), &json!({}));
}

#[tokio::test(start_paused = true)]
async fn offline_export_falls_back_to_text() {
    let mut session = DocumentSession::new(
        store().find_by_name("Richiesta Ferie").expect("leave request"),
        SessionOptions::default().with_export_delay(Duration::from_millis(250)),
    );
    session.input("dipendente.nome", "Mario").expect("bind");

    let artifact = session.export().await.expect("export");

    assert!(artifact.degraded);
    assert!(artifact.file_name.starts_with("Richiesta_Ferie_"));
    assert!(artifact.file_name.ends_with(".txt"));
    let text = artifact.text().expect("utf-8 text");
    assert!(text.starts_with("Richiesta Ferie"));
    assert!(text.contains("Mario"));
}

#[test]
fn json_export_carries_the_bound_data() {
    let mut session = letter_session();
    session.input("oggetto", "Prova").expect("bind");
    let artifact = session.export_json().expect("export");
    assert!(artifact.file_name.ends_with(".json"));
    let data: serde_json::Value =
        serde_json::from_slice(&artifact.content).expect("valid JSON");
    assert_eq!(data["oggetto"], json!("Prova"));
}

#[test]
fn adding_an_item_refreshes_the_preview() {
    let mut session = letter_session();
    let before = session.current_preview().expect("preview").handle.id;

    let added = session.add_item("destinatari").expect("second item");

    assert_eq!(added.to_string(), "destinatari[1]");
    let after = session.current_preview().expect("preview").handle.id;
    assert!(after > before);
    assert!(
        session
            .form_data()
            .as_object()
            .expect("flat scan")
            .contains_key("destinatari[1].ufficio")
    );
}

#[test]
fn deeply_nested_input_renders_the_error_block() {
    let template = store().find_by_name("Richiesta Ferie").expect("leave request");
    let mut session =
        DocumentSession::new(template, SessionOptions::default().with_max_preview_depth(4));
    let path = format!("motivazione{}", "[0]".repeat(20));
    session.input(&path, "profondo").expect("bind");
    assert!(session.current_preview().expect("preview").failed);

    let too_deep = vec!["a"; 200_000].join(".");
    assert!(matches!(session.input(&too_deep, "x"), Err(DocError::Path(_))));
}
