pub mod ai;
pub mod config;
pub mod extraction;
pub mod models;
pub mod pipeline;
pub mod render;

pub use ai::{LocalFallbackStyle, StructuringError, StructuringOrchestrator};
pub use config::{load_dotenv, ConfigError, PipelineConfig};
pub use extraction::{classify, intake, ExtractionEngine, ExtractorRegistry};
pub use models::*;
pub use pipeline::{load_files, load_specification, DocumentPipeline, PipelineError, PipelineOutput};
pub use render::{output_file_name, write_atomically, DocumentRenderer, RenderError, RenderOptions};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
/// Default: warn for dependencies, info for this crate. `RUST_LOG` overrides.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,reqflow=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
