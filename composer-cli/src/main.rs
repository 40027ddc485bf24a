//! # Composer CLI
//!
//! Create, inspect and export composer documents from the command line.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Parser, Subcommand};
use composer_core::scene::MemoryScene;
use composer_core::{DocumentState, DocumentStore, EditorConfig, EditorSession, FileStore};
use composer_export::{export_file_name, DocumentExporter, ExportFormat, ExportOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Composer document tool.
#[derive(Debug, Parser)]
#[command(name = "composer", version, about)]
struct Cli {
    /// JSON editor config file (environment overrides still apply).
    #[arg(long, global = true, env = "COMPOSER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write an empty document with the configured canvas.
    New {
        /// Output document path.
        file: PathBuf,
    },
    /// Print a document's canvas, layers and paint order.
    Inspect {
        /// Document path.
        file: PathBuf,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Render a document to an image.
    Export {
        /// Document path.
        file: PathBuf,
        /// Output format.
        #[arg(long, value_parser = parse_format, default_value = "png")]
        format: ExportFormat,
        /// JPEG quality (0-100).
        #[arg(long, default_value_t = composer_export::DEFAULT_QUALITY)]
        quality: u8,
        /// Pixel multiplier.
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        /// Export area width (requires --height).
        #[arg(long, requires = "height")]
        width: Option<u32>,
        /// Export area height (requires --width).
        #[arg(long, requires = "width")]
        height: Option<u32>,
        /// Output path (default: canvas-export-<timestamp>.<ext> next to the document).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    match raw.to_ascii_lowercase().as_str() {
        "png" => Ok(ExportFormat::Png),
        "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
        "svg" => Ok(ExportFormat::Svg),
        other => Err(format!("unknown format '{other}' (expected png, jpg or svg)")),
    }
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,composer_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,composer_core=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    let base = match path {
        Some(path) => EditorConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    Ok(base.with_env_overrides(|key| std::env::var(key).ok()))
}

async fn load_document(file: &Path) -> anyhow::Result<DocumentState> {
    FileStore::new(file)
        .load()
        .await
        .with_context(|| format!("reading {}", file.display()))?
        .with_context(|| format!("no document at {}", file.display()))
}

async fn new_document(file: &Path, config: &EditorConfig) -> anyhow::Result<()> {
    let document = config.canvas.document();
    FileStore::new(file)
        .save(&document)
        .await
        .with_context(|| format!("writing {}", file.display()))?;
    println!(
        "Created {} ({}x{})",
        file.display(),
        document.width,
        document.height
    );
    Ok(())
}

fn inspect(document: DocumentState, config: EditorConfig, json: bool) -> anyhow::Result<()> {
    let mut session = EditorSession::with_document(MemoryScene::new(), document, config);
    let notices = session.take_notices();
    let document = session.document();
    let paint_order = session.paint_order();

    if json {
        let summary = serde_json::json!({
            "width": document.width,
            "height": document.height,
            "background": document.background_color,
            "layers": document.layers.iter().map(|layer| serde_json::json!({
                "id": layer.id,
                "type": layer.layer_type(),
                "x": layer.x,
                "y": layer.y,
                "width": layer.width,
                "height": layer.height,
                "rotation": layer.rotation,
                "locked": layer.locked,
            })).collect::<Vec<_>>(),
            "paint_order": paint_order,
            "notices": notices.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Canvas {}x{} background {}",
        document.width, document.height, document.background_color
    );
    println!("{} layer(s):", document.layer_count());
    for layer in &document.layers {
        println!(
            "  {:<12} {:<6} at ({}, {}) size {}x{} rot {}{}",
            layer.id.as_str(),
            format!("{:?}", layer.layer_type()),
            layer.x,
            layer.y,
            layer.width,
            layer.height,
            layer.rotation,
            if layer.locked { " [locked]" } else { "" },
        );
    }
    let order: Vec<&str> = paint_order.iter().map(|id| id.as_str()).collect();
    println!("Paint order (back to front): {}", order.join(", "));
    for notice in notices {
        println!("Notice: {notice}");
    }
    Ok(())
}

fn export(
    document: &DocumentState,
    file: &Path,
    options: ExportOptions,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let resources = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let output = match output {
        Some(path) => path,
        None => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or_default();
            resources.join(export_file_name(options.format, timestamp))
        }
    };

    let bytes = DocumentExporter::new(options)
        .with_resources_dir(&resources)
        .export(document)
        .context("rendering document")?;
    std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(path = %output.display(), bytes = bytes.len(), "Export written");
    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "Loaded editor config");

    match cli.command {
        Command::New { file } => new_document(&file, &config).await?,
        Command::Inspect { file, json } => {
            let document = load_document(&file).await?;
            inspect(document, config, json)?;
        }
        Command::Export {
            file,
            format,
            quality,
            scale,
            width,
            height,
            output,
        } => {
            let document = load_document(&file).await?;
            let options = ExportOptions {
                format,
                quality,
                width,
                height,
                scale,
            };
            let path = export(&document, &file, options, output)?;
            println!("Exported {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_core::{Layer, TextStyle};

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("PNG"), Ok(ExportFormat::Png));
        assert_eq!(parse_format("jpeg"), Ok(ExportFormat::Jpg));
        assert_eq!(parse_format("svg"), Ok(ExportFormat::Svg));
        assert!(parse_format("gif").is_err());
    }

    #[test]
    fn test_cli_parses_export_flags() {
        let cli = Cli::try_parse_from([
            "composer", "export", "doc.json", "--format", "jpg", "--scale", "2", "--width",
            "10", "--height", "20",
        ])
        .expect("parse");
        match cli.command {
            Command::Export {
                format,
                scale,
                width,
                height,
                ..
            } => {
                assert_eq!(format, ExportFormat::Jpg);
                assert!((scale - 2.0).abs() < f32::EPSILON);
                assert_eq!((width, height), (Some(10), Some(20)));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["composer", "export", "doc.json", "--width", "10"]).is_err());
    }

    #[tokio::test]
    async fn test_new_then_export_svg() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("doc.json");
        new_document(&file, &EditorConfig::default())
            .await
            .expect("new");

        let mut document = load_document(&file).await.expect("load");
        assert_eq!(document.layer_count(), 0);
        document
            .add_layer(Layer::text(TextStyle::new("hi")))
            .expect("add");

        let options = ExportOptions {
            format: ExportFormat::Svg,
            ..ExportOptions::default()
        };
        let out = export(&document, &file, options, None).expect("export");
        assert_eq!(out.parent(), Some(dir.path()));
        let svg = std::fs::read_to_string(out).expect("read");
        assert!(svg.contains(">hi</tspan>"));
    }

    #[tokio::test]
    async fn test_missing_document_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_document(&dir.path().join("absent.json")).await.is_err());
    }
}
