//! reqflow: turn a pile of office documents into one structured PDF

use clap::Parser;
use reqflow::render::{default_output_dir, DEFAULT_DOCUMENT_KIND};
use reqflow::{
    load_dotenv, load_files, load_specification, output_file_name, write_atomically,
    DocumentPipeline, LocalFallbackStyle, PipelineConfig, PipelineError, PipelineEvent,
    RenderOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Extract, structure and render documents into a single PDF.
#[derive(Parser, Debug)]
#[command(name = "reqflow", version, about)]
struct Cli {
    /// Input files (PDF, Word, Excel/CSV, images)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Document specification text
    #[arg(long, conflicts_with = "spec_file", default_value = "")]
    spec: String,

    /// Read the document specification from a file
    #[arg(long)]
    spec_file: Option<PathBuf>,

    /// Output name prefix; the date is appended
    #[arg(long, default_value = DEFAULT_DOCUMENT_KIND)]
    kind: String,

    /// Top heading of the offline fallback, also drawn as the page-one header
    #[arg(long)]
    title: Option<String>,

    /// Directory for the PDF (defaults to Downloads)
    #[arg(long, env = "REQFLOW_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Fail instead of formatting locally when both providers are unavailable
    #[arg(long)]
    no_fallback: bool,

    /// Append a page listing every source file
    #[arg(long)]
    source_appendix: bool,

    /// Also write the structured text to stdout
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    reqflow::init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("[reqflow] {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let mut config = PipelineConfig::from_env()?;
    if cli.no_fallback {
        config.fallback_to_local = false;
    }

    let specification = match &cli.spec_file {
        Some(path) => load_specification(path).await?,
        None => cli.spec.clone(),
    };

    let style = match &cli.title {
        Some(title) => LocalFallbackStyle {
            title: title.clone(),
        },
        None => LocalFallbackStyle::default(),
    };
    let render_options = RenderOptions {
        header_title: cli.title.clone(),
        source_appendix: cli.source_appendix,
        ..RenderOptions::default()
    };

    let pipeline = DocumentPipeline::from_config(&config, style, render_options)
        .with_progress(Arc::new(|event: PipelineEvent| {
            tracing::debug!(?event, "[reqflow] Progress");
        }));

    let files = load_files(&cli.files).await?;
    let output = pipeline.run(files, &specification).await?;

    for rejected in &output.rejected {
        eprintln!("skipped {} ({:?})", rejected.name, rejected.reason);
    }
    if cli.print {
        println!("{}", output.outcome.text);
    }

    let dir = cli.output_dir.unwrap_or_else(default_output_dir);
    let name = output_file_name(&cli.kind, chrono::Local::now().date_naive());
    let path = write_atomically(&dir, &name, &output.rendered.bytes)?;

    eprintln!(
        "wrote {} ({} pages, structured by {})",
        path.display(),
        output.rendered.document.page_count(),
        output.outcome.source_provider
    );
    Ok(())
}
