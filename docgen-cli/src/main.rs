//! `docgen`: drive template sessions from the command line.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docgen::io::{OutputDestination, OutputOptions, emit, read_source, write_artifact, write_text};
use docgen::{
    DirectoryTemplateStore, DocumentSession, FieldPath, FlatFieldKind, MemoryTemplateStore,
    Segment, SessionOptions, Template, TemplateKey, TemplateSchema, TemplateStore,
};

#[derive(Debug, Parser)]
#[command(
    name = "docgen",
    version,
    about = "Fill document templates, preview them and export the result"
)]
struct Cli {
    /// Directory with extra template documents (loaded on top of the built-in ones)
    #[arg(long = "templates-dir", value_name = "DIR", global = true)]
    templates_dir: Option<PathBuf>,

    /// Latency of the local export fallback, in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", global = true)]
    delay_ms: Option<u64>,

    /// Column width of the text export
    #[arg(long = "wrap", value_name = "COLUMNS", global = true)]
    wrap: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available templates
    Templates,
    /// Print the control tree of a template with the path of every control
    Form { template: String },
    /// Flatten a template into dotted field descriptors
    Fields { template: String },
    /// Print generated sample data for a template
    Sample { template: String },
    /// Validate a JSON document against a template and print the bound data
    Import {
        template: String,
        /// File path, or "-" for stdin
        source: String,
    },
    /// Write the HTML preview of a filled template
    Preview {
        template: String,
        #[command(flatten)]
        fill: FillArgs,
        /// Output file ("-" writes to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Export a filled template as a document artifact
    Export {
        template: String,
        #[command(flatten)]
        fill: FillArgs,
        /// Directory receiving the artifact
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
        output: PathBuf,
        /// Export the raw form data as JSON instead of a document
        #[arg(long = "json")]
        json: bool,
    },
    /// Export the same filled data through several templates at once
    Package {
        /// Templates to export; the first one receives the fill values
        #[arg(required = true, num_args = 1..)]
        templates: Vec<String>,
        #[command(flatten)]
        fill: FillArgs,
        /// Directory receiving the artifacts
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct FillArgs {
    /// JSON document to import before applying --set values ("-" for stdin)
    #[arg(long = "data", value_name = "FILE")]
    data: Option<String>,

    /// Control value as path=value, e.g. destinatari[0].ufficio=Roma
    #[arg(long = "set", value_name = "PATH=VALUE", action = ArgAction::Append)]
    set: Vec<String>,

    /// Start from the built-in example document of the template
    #[arg(long = "example")]
    example: bool,

    /// Start from generated sample data
    #[arg(long = "sample", conflicts_with = "example")]
    sample: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let store = load_store(cli.templates_dir.as_ref())?;
    let options = session_options(&cli);

    match &cli.command {
        Command::Templates => list_templates(&store),
        Command::Form { template } => {
            let session = DocumentSession::new(find_template(&store, template)?, options);
            write_text(&OutputDestination::Stdout, &session.form().root().outline())
                .map_err(|err| eyre!("{err:#}"))
        }
        Command::Fields { template } => print_fields(&find_template(&store, template)?),
        Command::Sample { template } => {
            let mut session = DocumentSession::new(find_template(&store, template)?, options);
            session.load_sample();
            print_value(session.data())
        }
        Command::Import { template, source } => {
            let mut session = DocumentSession::new(find_template(&store, template)?, options);
            let text = read_source(source).map_err(|err| eyre!("{err:#}"))?;
            session
                .import_json(&text)
                .wrap_err_with(|| format!("{source} does not fit {}", session.template().name))?;
            print_value(session.data())
        }
        Command::Preview {
            template,
            fill,
            output,
        } => {
            let mut session = DocumentSession::new(find_template(&store, template)?, options);
            apply_fill(&mut session, &store, fill)?;
            let preview = session.preview();
            if preview.failed {
                warn!("preview could not render the data; wrote the error block");
            }
            let destination = OutputDestination::from_arg(output.as_deref());
            write_text(&destination, &preview.markup).map_err(|err| eyre!("{err:#}"))
        }
        Command::Export {
            template,
            fill,
            output,
            json,
        } => {
            let mut session = DocumentSession::new(find_template(&store, template)?, options);
            apply_fill(&mut session, &store, fill)?;
            let artifact = if *json {
                session.export_json()?
            } else {
                session.export().await?
            };
            let path = write_artifact(&artifact, output).map_err(|err| eyre!("{err:#}"))?;
            info!(path = %path.display(), degraded = artifact.degraded, "export written");
            println!("{}", path.display());
            Ok(())
        }
        Command::Package {
            templates,
            fill,
            output,
        } => {
            let templates = templates
                .iter()
                .map(|name| find_template(&store, name))
                .collect::<Result<Vec<_>>>()?;
            let mut session = DocumentSession::new(templates[0].clone(), options);
            apply_fill(&mut session, &store, fill)?;
            let artifacts = session.export_package(&templates).await?;
            for artifact in &artifacts {
                let path = write_artifact(artifact, output).map_err(|err| eyre!("{err:#}"))?;
                println!("{}", path.display());
            }
            info!(documents = artifacts.len(), "package written");
            Ok(())
        }
    }
}

fn load_store(dir: Option<&PathBuf>) -> Result<MemoryTemplateStore> {
    let builtin = MemoryTemplateStore::builtin().wrap_err("built-in templates are invalid")?;
    match dir {
        Some(dir) => DirectoryTemplateStore::open_into(dir, builtin)
            .map(DirectoryTemplateStore::into_inner)
            .map_err(|err| eyre!("{err:#}")),
        None => Ok(builtin),
    }
}

fn session_options(cli: &Cli) -> SessionOptions {
    let mut options = SessionOptions::default();
    if let Some(delay) = cli.delay_ms {
        options = options.with_export_delay(Duration::from_millis(delay));
    }
    if let Some(width) = cli.wrap {
        options = options.with_wrap_width(width);
    }
    options
}

fn find_template(store: &MemoryTemplateStore, name: &str) -> Result<Template> {
    store
        .find_by_name(name)
        .wrap_err("run `docgen templates` to see the available names")
}

fn list_templates(store: &MemoryTemplateStore) -> Result<()> {
    for summary in store.list_templates() {
        let (kind, id) = match summary.key {
            TemplateKey::Fields(id) => ("fields", id),
            TemplateKey::Schema(id) => ("schema", id),
        };
        let mut line = format!(
            "{kind:<6} {id:>3}  {}  ({} fields)",
            summary.name, summary.field_count
        );
        if let Some(description) = summary.description.as_deref() {
            line.push_str(" - ");
            line.push_str(description);
        }
        println!("{line}");
    }
    Ok(())
}

fn print_fields(template: &Template) -> Result<()> {
    match &template.schema {
        TemplateSchema::Fields(fields) => {
            for field in fields {
                println!(
                    "{}\t{}\t{}{}",
                    field.name,
                    field.label,
                    field.kind.as_str(),
                    required_marker(field.required)
                );
            }
        }
        TemplateSchema::Node(node) => {
            for field in node.flatten_fields() {
                let kind = match field.kind {
                    FlatFieldKind::Scalar(kind) => kind.as_str(),
                    FlatFieldKind::Array => "array",
                };
                println!(
                    "{}\t{}\t{kind}{}",
                    field.name,
                    field.label,
                    required_marker(field.required)
                );
            }
        }
    }
    Ok(())
}

fn required_marker(required: bool) -> &'static str {
    if required { "\trequired" } else { "" }
}

fn print_value(value: &Value) -> Result<()> {
    emit(value, &OutputOptions::default()).map_err(|err| eyre!("{err:#}"))
}

/// Seed the session from --example/--sample/--data, then apply every --set in order.
fn apply_fill(
    session: &mut DocumentSession,
    store: &MemoryTemplateStore,
    fill: &FillArgs,
) -> Result<()> {
    if fill.example {
        session.load_example(store)?;
    } else if fill.sample {
        session.load_sample();
    }
    if let Some(source) = fill.data.as_deref() {
        let text = read_source(source).map_err(|err| eyre!("{err:#}"))?;
        session
            .import_json(&text)
            .wrap_err_with(|| format!("failed to import {source}"))?;
    }
    for assignment in &fill.set {
        let (path, value) = assignment
            .split_once('=')
            .ok_or_else(|| eyre!("--set expects PATH=VALUE, got `{assignment}`"))?;
        let parsed = FieldPath::parse(path.trim())
            .wrap_err_with(|| format!("invalid path `{path}`"))?;
        ensure_items(session, &parsed)?;
        session.input(path.trim(), value)?;
    }
    Ok(())
}

/// Add array items until every index along `path` has a mounted control.
fn ensure_items(session: &mut DocumentSession, path: &FieldPath) -> Result<()> {
    for (depth, segment) in path.segments().iter().enumerate() {
        let Segment::Index(index) = segment else {
            continue;
        };
        let array_path = FieldPath::from_segments(path.segments()[..depth].to_vec());
        while let Some(array) = session.form().array(&array_path)
            && array.items.len() <= *index
        {
            session.add_item(&array_path.to_string())?;
        }
    }
    Ok(())
}
