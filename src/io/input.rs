use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use super::DocumentFormat;

/// Parse structured data in any supported format into a `serde_json::Value`.
pub fn parse_document_str(contents: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str::<Value>(contents).with_context(|| "failed to parse JSON document")
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => {
            serde_yaml::from_str::<Value>(contents).with_context(|| "failed to parse YAML document")
        }
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => toml::from_str::<toml::Table>(contents)
            .with_context(|| "failed to parse TOML document")
            .and_then(|table| {
                serde_json::to_value(table).context("failed to convert TOML to JSON")
            }),
    }
}

/// Read raw text from a file, or from stdin when `source` is `-`.
pub fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(Path::new(source)).with_context(|| format!("failed to read {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_json_documents() {
        let raw = "{\"nome\":\"Mario\"}";
        let parsed = parse_document_str(raw, DocumentFormat::Json).unwrap();
        assert_eq!(parsed["nome"], json!("Mario"));
    }

    #[test]
    fn reports_malformed_json() {
        let err = parse_document_str("{\"nome\":", DocumentFormat::Json).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON document"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn parse_yaml_documents() {
        let raw = "name: Lettera\nschema:\n  oggetto:\n    type: textarea";
        let parsed = parse_document_str(raw, DocumentFormat::Yaml).unwrap();
        assert_eq!(parsed["schema"]["oggetto"]["type"], json!("textarea"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn parse_toml_documents() {
        let raw = "name = \"Contratto\"\n[[fields]]\nname = \"nome\"";
        let parsed = parse_document_str(raw, DocumentFormat::Toml).unwrap();
        assert_eq!(parsed["fields"][0]["name"], json!("nome"));
        assert_eq!(parsed["name"], json!("Contratto"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_template_documents_load() {
        let raw = "name = \"Richiesta\"\n\n[schema.motivazione]\ntype = \"textarea\"\nlabel = \"Motivazione\"\n";
        let template = crate::schema::load_template_str(raw, DocumentFormat::Toml, 1)
            .expect("toml template");
        assert_eq!(template.name, "Richiesta");
        assert_eq!(template.schema.field_count(), 1);
    }

    #[test]
    fn read_source_reports_missing_files() {
        let err = read_source("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
