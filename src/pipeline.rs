//! End-to-end pipeline: intake -> extraction -> structuring -> rendering

use crate::ai::{
    CredentialManager, KeyedProvider, LocalFallbackStyle, StructuringError, StructuringOrchestrator,
};
use crate::config::{ConfigError, PipelineConfig};
use crate::extraction::{intake, ExtractionEngine, ExtractorRegistry, RejectedFile};
use crate::models::{emit, Corpus, PipelineEvent, ProgressCallback, SourceFile, StructuringOutcome};
use crate::render::{DocumentRenderer, RenderError, RenderOptions, RenderOutput};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Structuring(#[from] StructuringError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything one run produced
#[derive(Debug)]
pub struct PipelineOutput {
    pub corpus: Corpus,
    pub rejected: Vec<RejectedFile>,
    pub outcome: StructuringOutcome,
    pub rendered: RenderOutput,
}

pub struct DocumentPipeline {
    engine: ExtractionEngine,
    orchestrator: StructuringOrchestrator,
    renderer: DocumentRenderer,
    progress: Option<ProgressCallback>,
}

impl DocumentPipeline {
    pub fn new(
        engine: ExtractionEngine,
        orchestrator: StructuringOrchestrator,
        renderer: DocumentRenderer,
    ) -> Self {
        Self {
            engine,
            orchestrator,
            renderer,
            progress: None,
        }
    }

    /// Standard extractors, the remote provider chain and a PDF renderer
    pub fn from_config(
        config: &PipelineConfig,
        style: LocalFallbackStyle,
        render_options: RenderOptions,
    ) -> Self {
        let registry = ExtractorRegistry::with_tesseract(&config.tesseract_bin);
        let engine = ExtractionEngine::new(registry);
        let renderer = DocumentRenderer::new(render_options).with_title(style.title.clone());
        let orchestrator = StructuringOrchestrator::from_config(config, style);

        tracing::info!(
            gemini_key = CredentialManager::has_api_key(KeyedProvider::Gemini),
            openai_key = CredentialManager::has_api_key(KeyedProvider::OpenAi),
            fallback = config.fallback_to_local,
            max_retries = config.max_retries,
            "[Pipeline] Configured"
        );

        Self::new(engine, orchestrator, renderer)
    }

    /// Route every stage's events to one sink
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.engine = self.engine.with_progress(progress.clone());
        self.orchestrator = self.orchestrator.with_progress(progress.clone());
        self.renderer = self.renderer.with_progress(progress.clone());
        self.progress = Some(progress);
        self
    }

    pub async fn run(
        &self,
        files: Vec<SourceFile>,
        specification: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let intake = intake(files);
        if !intake.rejected.is_empty() {
            tracing::warn!(
                "[Pipeline] Dropped {} files ({} unsupported)",
                intake.rejected.len(),
                intake.unsupported_count()
            );
            emit(
                &self.progress,
                PipelineEvent::FilesRejected {
                    count: intake.rejected.len(),
                },
            );
        }

        let corpus = self.engine.extract_batch(&intake.accepted).await;
        let outcome = self.orchestrator.structure(&corpus, specification).await?;
        let rendered = self.renderer.render(&outcome.text, &corpus)?;

        Ok(PipelineOutput {
            corpus,
            rejected: intake.rejected,
            outcome,
            rendered,
        })
    }
}

/// Read input files from disk, failing on the first unreadable path
pub async fn load_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>, PipelineError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SourceFile::from_path(path)
            .await
            .map_err(|source| PipelineError::Read {
                path: path.clone(),
                source,
            })?;
        files.push(file);
    }
    Ok(files)
}

/// Read the document specification from a file
pub async fn load_specification(path: &Path) -> Result<String, PipelineError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })
}
