use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::export::ExportArtifact;

use super::DocumentFormat;

/// Destination for serialized output.
#[derive(Debug, Clone)]
pub enum OutputDestination {
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    pub fn file(path: impl AsRef<Path>) -> Self {
        OutputDestination::File(path.as_ref().to_path_buf())
    }

    /// `-` or nothing means stdout.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => OutputDestination::file(path),
            _ => OutputDestination::Stdout,
        }
    }
}

/// Controls how data values are serialized.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: DocumentFormat,
    pub pretty: bool,
    pub destinations: Vec<OutputDestination>,
}

impl OutputOptions {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            pretty: true,
            destinations: vec![OutputDestination::Stdout],
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_destinations(mut self, destinations: Vec<OutputDestination>) -> Self {
        self.destinations = destinations;
        self
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::new(DocumentFormat::Json)
    }
}

/// Serialize `value` and write it to every configured destination.
pub fn emit(value: &Value, options: &OutputOptions) -> Result<()> {
    if options.destinations.is_empty() {
        return Ok(());
    }
    let payload = serialize_value(value, options)?;
    for destination in &options.destinations {
        write_text(destination, &payload)?;
    }
    Ok(())
}

/// Write `payload` followed by a newline.
pub fn write_text(destination: &OutputDestination, payload: &str) -> Result<()> {
    write_payload(destination, payload).with_context(|| match destination {
        OutputDestination::Stdout => "failed to write to stdout".to_string(),
        OutputDestination::File(path) => {
            format!("failed to write to file {}", path.display())
        }
    })
}

/// Save an export artifact into `dir` under its own file name and return the written path.
pub fn write_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.content)
        .with_context(|| format!("failed to write artifact {}", path.display()))?;
    Ok(path)
}

fn serialize_value(value: &Value, options: &OutputOptions) -> Result<String> {
    match options.format {
        DocumentFormat::Json => {
            if options.pretty {
                serde_json::to_string_pretty(value).context("failed to serialize JSON")
            } else {
                serde_json::to_string(value).context("failed to serialize JSON")
            }
        }
        #[cfg(feature = "yaml")]
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
        #[cfg(feature = "toml")]
        DocumentFormat::Toml => {
            if options.pretty {
                toml::to_string_pretty(value).context("failed to serialize TOML")
            } else {
                toml::to_string(value).context("failed to serialize TOML")
            }
        }
    }
}

fn write_payload(destination: &OutputDestination, payload: &str) -> Result<()> {
    match destination {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout
                .write_all(payload.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
                .context("failed to flush stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
        OutputDestination::File(path) => {
            let mut file = File::create(path)?;
            file.write_all(payload.as_bytes())?;
            file.write_all(b"\n")?;
            file.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emit_is_a_noop_without_destinations() {
        let options = OutputOptions::default().with_destinations(Vec::new());
        emit(&json!({"ok": true}), &options).unwrap();
    }

    #[test]
    fn writes_to_file_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("emit.json");
        let options = OutputOptions::default().with_destinations(vec![OutputDestination::file(&path)]);
        emit(&json!({"nome": "Mario"}), &options).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"nome\": \"Mario\""));
    }

    #[test]
    fn writes_artifacts_under_their_file_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("artifacts");
        let artifact = ExportArtifact {
            file_name: "Lettera_1.txt".to_string(),
            media_type: "text/plain".to_string(),
            content: b"Lettera\n".to_vec(),
            degraded: true,
        };
        let path = write_artifact(&artifact, &dir).unwrap();
        assert_eq!(path, dir.join("Lettera_1.txt"));
        assert_eq!(fs::read(&path).unwrap(), b"Lettera\n");
    }

    #[test]
    fn dash_means_stdout() {
        assert!(matches!(
            OutputDestination::from_arg(Some(Path::new("-"))),
            OutputDestination::Stdout
        ));
        assert!(matches!(
            OutputDestination::from_arg(Some(Path::new("out.html"))),
            OutputDestination::File(_)
        ));
    }
}
