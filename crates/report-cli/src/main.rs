//! Lab Report Pipeline CLI
//!
//! The `labreport` command exposes the pipeline stages for local use and
//! debugging against a live workflow endpoint.
//!
//! ## Commands
//!
//! - `template`: Print the template data built from a workflow output
//! - `render`: Render a workflow output (plus figures and tables) to DOCX
//! - `workflow`: Run the analysis workflow for a remote document
//! - `check-config`: Show the resolved workflow endpoint configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docx_report::{build_doc_template_data, DocxRenderer, FigureImage, GenerateReportInput};
use report_pipeline::inputs::{fit_figure_size, image_dimensions, workflow_inputs};
use report_pipeline::{apply_table_rows, extract_result_json, init_tracing};
use report_state::{ContentDigest, ExperimentFileDescriptor, FileRef, FileType};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use workflow_client::config::{ENV_API_KEY, ENV_API_URL};
use workflow_client::{RunOptions, WorkflowClient, WorkflowConfig};

#[derive(Parser)]
#[command(name = "labreport")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lab report generation pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the template data built from a workflow output
    Template {
        /// Workflow response or bare result_json (JSON file)
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a workflow output to a DOCX document
    Render {
        /// Workflow response or bare result_json (JSON file)
        input: PathBuf,

        /// Output DOCX path
        #[arg(short, long)]
        out: PathBuf,

        /// Document title
        #[arg(short, long, default_value = "report")]
        title: String,

        /// Figure image, in figure order (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        /// Table rows file `{"rows": [[...]]}`, one per experiment (repeatable)
        #[arg(long = "table")]
        tables: Vec<PathBuf>,
    },

    /// Run the analysis workflow for a remote document
    Workflow {
        /// URL the workflow can fetch the source document from
        #[arg(long)]
        document_url: String,

        /// File name sent with the document
        #[arg(long, default_value = "manual.pdf")]
        name: String,

        /// End-user identifier passed to the workflow
        #[arg(long)]
        user: String,

        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Write the raw response to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the resolved workflow endpoint configuration
    CheckConfig {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },
}

#[derive(clap::Args, Clone, Debug, Default)]
struct EndpointArgs {
    /// Workflow service base URL
    #[arg(long, env = "DIFY_API_URL")]
    api_url: Option<String>,

    /// Workflow API key
    #[arg(long, env = "DIFY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Template { input, output } => cmd_template(&input, output.as_deref()),
        Commands::Render {
            input,
            out,
            title,
            images,
            tables,
        } => cmd_render(&input, &out, &title, &images, &tables),
        Commands::Workflow {
            document_url,
            name,
            user,
            endpoint,
            output,
        } => cmd_workflow(&endpoint, &document_url, &name, &user, output.as_deref()).await,
        Commands::CheckConfig { endpoint } => cmd_check_config(&endpoint),
    }
}

// ---------------------------------------------------------------------------
// Input loading
// ---------------------------------------------------------------------------

/// Read a workflow output file. A full response is unwrapped to its
/// `result_json`; anything else is taken as the result itself.
fn read_result_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow output: {:?}", path))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("Workflow output is not valid JSON: {:?}", path))?;
    Ok(extract_result_json(&raw).unwrap_or(raw))
}

fn read_figure(path: &Path) -> Result<FigureImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let dimensions = image_dimensions(&bytes);
    if dimensions.is_none() {
        warn!(path = ?path, "Could not read image dimensions, using default size");
    }
    let (width, height) = fit_figure_size(dimensions);
    FigureImage::new(bytes, width as f64, height as f64)
        .with_context(|| format!("Unusable image: {:?}", path))
}

/// Accepts `{"rows": [...]}` or a bare rows array.
fn read_table_rows(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read table: {:?}", path))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Table is not valid JSON: {:?}", path))?;
    match value {
        Value::Object(mut payload) => match payload.remove("rows") {
            Some(rows @ Value::Array(_)) => Ok(rows),
            _ => anyhow::bail!("Table has no rows array: {:?}", path),
        },
        rows @ Value::Array(_) => Ok(rows),
        _ => anyhow::bail!("Table must be an object or an array: {:?}", path),
    }
}

fn write_or_print(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write to {:?}", path))?;
            println!("Wrote {:?}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_template(input: &Path, output: Option<&Path>) -> Result<()> {
    let result_json = read_result_json(input)?;
    let data = build_doc_template_data(&result_json);
    let text = serde_json::to_string_pretty(&data)?;
    write_or_print(output, &text)
}

fn cmd_render(
    input: &Path,
    out: &Path,
    title: &str,
    images: &[PathBuf],
    tables: &[PathBuf],
) -> Result<()> {
    let mut result_json = read_result_json(input)?;

    let table_rows = tables
        .iter()
        .map(|path| read_table_rows(path))
        .collect::<Result<Vec<_>>>()?;
    apply_table_rows(&mut result_json, &table_rows);

    let figure_images = images
        .iter()
        .map(|path| read_figure(path))
        .collect::<Result<Vec<_>>>()?;

    let bytes = DocxRenderer::new()
        .render(&GenerateReportInput {
            title,
            dify_output: &result_json,
            figure_images: &figure_images,
        })
        .context("Failed to render report")?;

    std::fs::write(out, &bytes).with_context(|| format!("Failed to write to {:?}", out))?;
    let digest = ContentDigest::from_bytes(&bytes);
    info!(path = ?out, bytes = bytes.len(), digest = %digest.short(), "Rendered report");
    println!("Rendered {:?} ({} bytes, sha256 {})", out, bytes.len(), digest.short());
    Ok(())
}

/// Command-line values take precedence; other settings come from the
/// environment.
fn resolve_config(endpoint: &EndpointArgs) -> Result<WorkflowConfig> {
    let config = WorkflowConfig::from_lookup(|key| match key {
        ENV_API_URL => endpoint.api_url.clone(),
        ENV_API_KEY => endpoint.api_key.clone(),
        other => std::env::var(other).ok(),
    })
    .context("Workflow endpoint is not configured")?;
    Ok(config)
}

async fn cmd_workflow(
    endpoint: &EndpointArgs,
    document_url: &str,
    name: &str,
    user: &str,
    output: Option<&Path>,
) -> Result<()> {
    let config = resolve_config(endpoint)?;
    let client = WorkflowClient::new(config).context("Failed to create workflow client")?;

    let document = ExperimentFileDescriptor {
        file_name: name.to_string(),
        file_type: FileType::Document,
        file_url: FileRef(document_url.to_string()),
        uploaded_at: None,
    };
    let inputs = workflow_inputs(&document, document_url);

    let response = client
        .run_workflow(inputs, RunOptions::for_user(user))
        .await
        .context("Workflow call failed")?;
    info!(run_id = %response.id, status = %response.status, "Workflow finished");

    let text = serde_json::to_string_pretty(&response.raw)?;
    write_or_print(output, &text)?;

    if let Some(message) = response.failure() {
        anyhow::bail!("Workflow run reported failure: {}", message);
    }
    if extract_result_json(&response.raw).is_none() {
        warn!("Workflow response did not include result_json");
    }
    Ok(())
}

fn cmd_check_config(endpoint: &EndpointArgs) -> Result<()> {
    let config = resolve_config(endpoint)?;
    println!("Endpoint:  {}", config.endpoint());
    println!("Timeout:   {} ms", config.timeout_ms);
    println!(
        "Retry:     {} attempt(s), {} ms apart",
        config.retry.effective_max_attempts(),
        config.retry.delay_ms
    );
    println!("API key:   set");
    Ok(())
}
