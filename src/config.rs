use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::device::Device;
use crate::error::{Result, SubtranError};
use crate::translate::DecodingOptions;

pub const DEFAULT_MODEL: &str = "facebook/nllb-200-distilled-600M";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hugging Face Inference API compatible model server
    HuggingFace,
    /// Local Ollama server
    Ollama,
}

impl BackendKind {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::HuggingFace => "https://api-inference.huggingface.co",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = SubtranError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(SubtranError::Config(format!(
                "Invalid backend '{}'. Valid backends: huggingface, ollama",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Which model server hosts the translation model
    pub backend: BackendKind,
    /// Base URL of the model server; the backend default is used when unset
    pub endpoint: Option<String>,
    /// Model identifier, e.g. a Hugging Face model repository name
    pub model: String,
    /// Bearer token for the model server (falls back to HF_TOKEN)
    pub api_token: Option<String>,
    /// Source language code forwarded to multilingual models
    pub source_language: Option<String>,
    /// Target language code forwarded to multilingual models
    pub target_language: Option<String>,
    /// Beam width for beam search decoding
    pub num_beams: u32,
    pub length_penalty: f32,
    /// Maximum output length in tokens
    pub max_length: u32,
    /// HTTP timeout per request
    pub timeout_secs: u64,
    /// Compute device requested from the model server
    pub device: Device,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::HuggingFace,
            endpoint: None,
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            source_language: None,
            target_language: None,
            num_beams: 5,
            length_penalty: 1.0,
            max_length: 512,
            timeout_secs: 300,
            device: Device::Auto,
        }
    }
}

impl TranslateConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.backend.default_endpoint())
            .trim_end_matches('/')
    }

    pub fn decoding_options(&self) -> DecodingOptions {
        DecodingOptions {
            num_beams: self.num_beams,
            length_penalty: self.length_penalty,
            max_length: self.max_length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of blocks per progress step; has no effect on the output
    pub batch_size: usize,
    /// Appended to the input file stem to name the output file
    pub suffix: String,
    /// Fail on malformed blocks instead of dropping them
    pub strict: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            suffix: "_translated".to_string(),
            strict: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtranError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtranError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtranError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.batch_size == 0 {
            return Err(SubtranError::Config("batch_size must be at least 1".to_string()));
        }
        if self.translate.num_beams == 0 {
            return Err(SubtranError::Config("num_beams must be at least 1".to_string()));
        }
        if self.translate.model.trim().is_empty() {
            return Err(SubtranError::Config("model must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_fixed_decoding_strategy() {
        let config = Config::default();
        let options = config.translate.decoding_options();
        assert_eq!(options.num_beams, 5);
        assert_eq!(options.length_penalty, 1.0);
        assert_eq!(options.max_length, 512);
        assert_eq!(config.output.batch_size, 8);
        assert_eq!(config.translate.model, DEFAULT_MODEL);
        assert_eq!(config.translate.endpoint(), "https://api-inference.huggingface.co");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subtran.toml");
        std::fs::write(
            &path,
            "[translate]\nbackend = \"ollama\"\nmodel = \"llama3.2:3b\"\n\n[output]\nbatch_size = 2\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.translate.backend, BackendKind::Ollama);
        assert_eq!(config.translate.endpoint(), "http://localhost:11434");
        assert_eq!(config.translate.num_beams, 5);
        assert_eq!(config.output.batch_size, 2);
        assert_eq!(config.output.suffix, "_translated");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subtran.toml");
        let mut config = Config::default();
        config.translate.endpoint = Some("http://localhost:8080/".to_string());
        config.translate.target_language = Some("fra_Latn".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.endpoint(), "http://localhost:8080");
        assert_eq!(loaded.translate.target_language.as_deref(), Some("fra_Latn"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subtran.toml");
        std::fs::write(&path, "[output]\nbatch_size = 0\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SubtranError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_toml_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subtran.toml");
        std::fs::write(&path, "[translate\nmodel = ").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SubtranError::Toml(_))));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("HF".parse::<BackendKind>().unwrap(), BackendKind::HuggingFace);
        assert_eq!("ollama".parse::<BackendKind>().unwrap(), BackendKind::Ollama);
        assert!("deepl".parse::<BackendKind>().is_err());
    }
}
