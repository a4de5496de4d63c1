use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SubtranError};
use crate::subtitle::{render_blocks, CaptionBlock, Document};
use crate::translate::{BackendFactory, TranslationBackend};

/// Result of translating one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub blocks: Vec<CaptionBlock>,
    /// Number of malformed blocks left out of the output
    pub dropped: usize,
}

impl TranslationOutcome {
    pub fn render(&self) -> String {
        render_blocks(&self.blocks)
    }
}

/// Runs caption blocks through the translation backend, one block at a time
pub struct TranslationDriver {
    config: Config,
    factory: Box<dyn BackendFactory>,
    backend: OnceCell<Box<dyn TranslationBackend>>,
    show_progress: bool,
}

impl TranslationDriver {
    pub fn new(config: Config, factory: Box<dyn BackendFactory>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            backend: OnceCell::new(),
            show_progress: true,
        })
    }

    /// Disable the progress bar, e.g. when output is not a terminal
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// The backend is created on first use and kept for the rest of the run
    async fn backend(&self) -> Result<&dyn TranslationBackend> {
        let backend = self.backend
            .get_or_try_init(|| self.factory.create())
            .await?;
        Ok(backend.as_ref())
    }

    /// Translate every well-formed block of the document, preserving order
    pub async fn translate_document(&self, document: &Document) -> Result<TranslationOutcome> {
        for malformed in &document.malformed {
            if self.config.output.strict {
                return Err(SubtranError::MalformedBlock {
                    position: malformed.position,
                    content: malformed.raw.clone(),
                });
            }
            warn!("Dropping malformed block #{} ({} line(s)): {:?}",
                  malformed.position, malformed.raw.lines().count(), malformed.raw);
        }

        let batch_size = self.config.output.batch_size;
        let total_batches = document.blocks.len().div_ceil(batch_size);
        let progress = self.progress_bar(total_batches as u64);
        let options = self.config.translate.decoding_options();

        let mut translated = Vec::with_capacity(document.blocks.len());

        for (batch_idx, batch) in document.blocks.chunks(batch_size).enumerate() {
            debug!("Translating batch {}/{} ({} blocks)", batch_idx + 1, total_batches, batch.len());

            for block in batch {
                let backend = self.backend().await?;
                let translation = backend.translate(&block.text, &options).await?;
                debug!("[{}] {} -> {}", block.index, block.text, translation);
                translated.push(block.with_text(translation));
            }

            progress.inc(1);
        }

        progress.finish_and_clear();

        Ok(TranslationOutcome {
            blocks: translated,
            dropped: document.malformed.len(),
        })
    }

    /// Read, translate and write one subtitle file
    pub async fn translate_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<TranslationOutcome> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        if !input_path.exists() {
            return Err(SubtranError::FileNotFound(input_path.display().to_string()));
        }

        info!("Reading subtitle file: {}", input_path.display());
        let content = fs::read_to_string(input_path).await?;
        let document = Document::parse(&content);
        info!("Parsed {} caption blocks", document.blocks.len());

        info!("Translating...");
        let outcome = self.translate_document(&document).await?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        info!("Writing translated subtitle file: {}", output_path.display());
        fs::write(output_path, outcome.render()).await?;

        if let Some(backend) = self.backend.get() {
            info!("Translated {} blocks with the {} backend", outcome.blocks.len(), backend.name());
        }
        if outcome.dropped > 0 {
            warn!("{} malformed block(s) were left out of the output", outcome.dropped);
        }
        info!("Translation completed! Output saved to: {}", output_path.display());

        Ok(outcome)
    }

    fn progress_bar(&self, batches: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(batches);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}

/// `<stem><suffix>.srt` next to the input, or inside `output_dir`
pub fn output_path_for(input_path: &Path, output_dir: Option<&Path>, suffix: &str) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .ok_or_else(|| SubtranError::Config(format!("Invalid input filename: {}", input_path.display())))?
        .to_string_lossy();
    let file_name = format!("{}{}.srt", stem, suffix);

    Ok(match output_dir {
        Some(dir) => dir.join(file_name),
        None => input_path.with_file_name(file_name),
    })
}
