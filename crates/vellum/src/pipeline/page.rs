use super::layout::PageLayout;
use crate::core::config::PipelineConfig;
use crate::error::{Result, VellumError};
use crate::image::{EnhancedImage, EnhancementProfile, load_image, save_image};
use crate::keywords::{extract_keywords, keywords_to_lines};
use crate::ocr::{OcrBackend, OrientationCorrector, TesseractBackend};
use crate::text::reconstruct;
use crate::types::{OrientationDecision, PageOutcome, PageOutputs, PageReport};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Runs every enabled stage for one page and writes its outputs.
///
/// Stages, in order:
///
/// 1. resolve the page under the source root (missing pages write nothing),
/// 2. create the mirrored output directory,
/// 3. build the machine rendition,
/// 4. correct orientation (machine rendition and, when archived, the raw scan),
/// 5. extract tokens from the machine rendition into `<name>.data.json`,
/// 6. rebuild the text into `<name>.texts.txt`,
/// 7. extract keywords into `<name>.words.txt`,
/// 8. archive the human rendition (or the machine one) at the mirrored image path.
///
/// [`process`](Self::process) never returns an error: every failure becomes a
/// [`PageOutcome`].
#[derive(Clone)]
pub struct PageProcessor {
    config: Arc<PipelineConfig>,
    backend: Arc<dyn OcrBackend>,
    corrector: OrientationCorrector,
}

impl PageProcessor {
    pub fn new(config: PipelineConfig, backend: Arc<dyn OcrBackend>) -> Self {
        Self {
            config: Arc::new(config),
            corrector: OrientationCorrector::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// Processor backed by the `tesseract` executable, set up from `config.ocr`.
    pub fn with_tesseract(config: PipelineConfig) -> Self {
        let mut backend = TesseractBackend::new().with_timeout(config.ocr.timeout());
        if let Some(program) = &config.ocr.tesseract_path {
            backend = backend.with_program(program);
        }
        Self::new(config, Arc::new(backend))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self, page: &str) -> Result<PageLayout> {
        PageLayout::resolve(page, &self.config.source_root, &self.config.output_root)
    }

    /// Process one page, isolating every failure into the returned outcome.
    pub async fn process(&self, page: &str) -> PageOutcome {
        let started = Instant::now();

        match self.run(page, started).await {
            Ok(report) => {
                tracing::info!(
                    page,
                    outputs = report.outputs.count(),
                    duration_ms = report.duration_ms,
                    "page processed"
                );
                PageOutcome::Success(report)
            }
            Err(VellumError::SourceNotFound { path }) => {
                tracing::warn!(page, path = %path.display(), "Image not found");
                PageOutcome::SourceNotFound {
                    page: page.trim().to_string(),
                    path,
                }
            }
            Err(e) => {
                tracing::error!(page, kind = e.kind(), error = %e, "page failed");
                PageOutcome::Failed {
                    page: page.trim().to_string(),
                    kind: e.kind().to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, page: &str, started: Instant) -> Result<PageReport> {
        let stages = &self.config.stages;
        let layout = self.layout(page)?;

        if !tokio::fs::metadata(&layout.source_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Err(VellumError::SourceNotFound {
                path: layout.source_path,
            });
        }

        tokio::fs::create_dir_all(&layout.output_dir).await.map_err(|e| {
            VellumError::persistence_with_source(
                format!("Failed to create output directory {}", layout.output_dir.display()),
                e,
            )
        })?;

        tracing::info!(page = %layout.page, "Enhancing image...");
        let keep_original = stages.human_readable;
        let source_path = layout.source_path.clone();
        let (mut machine, mut original) = blocking(move || {
            let original = load_image(&source_path)?;
            let machine = EnhancementProfile::Machine.apply(&original)?;
            Ok((machine, keep_original.then_some(original)))
        })
        .await?;

        let mut report = PageReport {
            page: layout.page.clone(),
            outputs: PageOutputs::default(),
            orientation: None,
            token_count: None,
            truncated_at: None,
            keyword_count: None,
            duration_ms: 0,
        };

        // Whether the file at the mirrored image path holds the current machine rendition.
        let mut machine_on_disk = false;

        if stages.rotate {
            tracing::info!(page = %layout.page, "Correcting orientation...");
            let correction = self.corrector.correct(machine, original, &layout.image_path).await?;
            machine = correction.enhanced;
            original = correction.original;
            machine_on_disk = !correction.decision.rotated();
            if let OrientationDecision::DetectionFailed { reason } = &correction.decision {
                tracing::debug!(page = %layout.page, reason, "orientation left unchanged");
            }
            report.orientation = Some(correction.decision);
        }

        if stages.data {
            if !machine_on_disk {
                write_image(machine.image().clone(), layout.image_path.clone()).await?;
            }

            tracing::info!(page = %layout.page, "Reading data from file...");
            let request = self.config.ocr.token_request();
            let tokens = self.backend.extract_tokens(&layout.image_path, &request).await?;
            report.token_count = Some(tokens.len());

            let json = serde_json::to_vec(&tokens)?;
            write_output(&layout.data_path, json).await?;
            report.outputs.data = Some(layout.data_path.clone());

            if stages.text_enabled() {
                tracing::info!(page = %layout.page, "Extracting texts from data...");
                let document = reconstruct(&tokens);
                report.truncated_at = document.truncation.as_ref().map(|t| t.position);
                write_output(&layout.text_path, document.text()).await?;
                report.outputs.text = Some(layout.text_path.clone());
            }

            if stages.keywords_enabled() {
                tracing::info!(page = %layout.page, "Extracting keywords from data...");
                let keywords = extract_keywords(&tokens);
                report.keyword_count = Some(keywords.len());
                write_output(&layout.keywords_path, keywords_to_lines(&keywords)).await?;
                report.outputs.keywords = Some(layout.keywords_path.clone());
            }
        }

        match original {
            Some(original) => {
                tracing::info!(page = %layout.page, "Enhancing image for human readability...");
                let human = blocking(move || EnhancementProfile::Human.apply(&original)).await?;
                write_enhanced(human, layout.image_path.clone()).await?;
            }
            None => write_enhanced(machine, layout.image_path.clone()).await?,
        }
        report.outputs.image = Some(layout.image_path.clone());

        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| VellumError::Other(format!("Image task panicked: {}", e)))?
}

async fn write_image(image: DynamicImage, path: PathBuf) -> Result<()> {
    blocking(move || save_image(&image, &path)).await
}

async fn write_enhanced(image: EnhancedImage, path: PathBuf) -> Result<()> {
    tracing::debug!(profile = %image.profile(), path = %path.display(), "archiving image");
    write_image(image.into_inner(), path).await
}

async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| VellumError::persistence_with_source(format!("Failed to write {}", path.display()), e))
}
