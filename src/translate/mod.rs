// Translation capability
//
// Model inference runs behind a model server; this module only speaks to it:
// - huggingface: Hugging Face Inference API compatible seq2seq endpoint
// - ollama: local Ollama server prompted for a translation

pub mod huggingface;
pub mod ollama;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, TranslateConfig};
use crate::error::Result;

pub use huggingface::HuggingFaceBackend;
pub use ollama::OllamaBackend;

/// Decoding strategy applied to every translation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingOptions {
    pub num_beams: u32,
    pub length_penalty: f32,
    pub max_length: u32,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            num_beams: 5,
            length_penalty: 1.0,
            max_length: 512,
        }
    }
}

/// A loaded translation model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate one caption text
    async fn translate(&self, text: &str, options: &DecodingOptions) -> Result<String>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Acquires a translation backend; called once per run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn TranslationBackend>>;
}

/// Factory for the HTTP backends selected in the configuration
pub struct HttpBackendFactory {
    config: TranslateConfig,
}

impl HttpBackendFactory {
    pub fn new(config: TranslateConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendFactory for HttpBackendFactory {
    async fn create(&self) -> Result<Box<dyn TranslationBackend>> {
        let device = self.config.device.resolve();
        info!("Loading model: {} ({:?} backend at {})",
              self.config.model, self.config.backend, self.config.endpoint());

        let backend: Box<dyn TranslationBackend> = match self.config.backend {
            BackendKind::HuggingFace => {
                let backend = HuggingFaceBackend::new(self.config.clone(), device)?;
                backend.check_availability().await?;
                Box::new(backend)
            }
            BackendKind::Ollama => {
                let backend = OllamaBackend::new(self.config.clone())?;
                backend.check_availability().await?;
                Box::new(backend)
            }
        };

        info!("Model '{}' ready", self.config.model);
        Ok(backend)
    }
}
