use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(author, version, about = "Translate SRT subtitle files with pretrained translation models", long_about = None)]
pub struct Args {
    /// Input SRT file
    pub input: PathBuf,

    /// Translation model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory to save the translated file (default: same as input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of blocks per progress step
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Device to run the model on (auto, cuda, cpu)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Model server type (huggingface, ollama)
    #[arg(long)]
    pub backend: Option<String>,

    /// Model server base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Source language code, for multilingual models
    #[arg(long)]
    pub source_lang: Option<String>,

    /// Target language code, for multilingual models
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Fail on malformed subtitle blocks instead of dropping them
    #[arg(long)]
    pub strict: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Override configuration values with the flags given on the command line
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(backend) = &self.backend {
            config.translate.backend = backend.parse()?;
        }
        if let Some(endpoint) = &self.endpoint {
            config.translate.endpoint = Some(endpoint.clone());
        }
        if let Some(model) = &self.model {
            config.translate.model = model.clone();
        }
        if let Some(device) = &self.device {
            config.translate.device = device.parse()?;
        }
        if let Some(lang) = &self.source_lang {
            config.translate.source_language = Some(lang.clone());
        }
        if let Some(lang) = &self.target_lang {
            config.translate.target_language = Some(lang.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.output.batch_size = batch_size as usize;
        }
        if self.strict {
            config.output.strict = true;
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, DEFAULT_MODEL};
    use crate::device::Device;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::try_parse_from(["subtran", "movie.srt"]).unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config).unwrap();

        assert_eq!(args.input, PathBuf::from("movie.srt"));
        assert_eq!(config.translate.model, DEFAULT_MODEL);
        assert_eq!(config.translate.device, Device::Auto);
        assert_eq!(config.output.batch_size, 8);
        assert!(!config.output.strict);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "subtran", "movie.srt",
            "--model", "Helsinki-NLP/opus-mt-en-de",
            "--batch-size", "1",
            "--device", "cpu",
            "--backend", "ollama",
            "--target-lang", "de",
            "--strict",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_to(&mut config).unwrap();

        assert_eq!(config.translate.model, "Helsinki-NLP/opus-mt-en-de");
        assert_eq!(config.translate.backend, BackendKind::Ollama);
        assert_eq!(config.translate.device, Device::Cpu);
        assert_eq!(config.translate.target_language.as_deref(), Some("de"));
        assert_eq!(config.output.batch_size, 1);
        assert!(config.output.strict);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(Args::try_parse_from(["subtran", "movie.srt", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn test_invalid_device_rejected() {
        let args = Args::try_parse_from(["subtran", "movie.srt", "--device", "tpu"]).unwrap();
        assert!(args.apply_to(&mut Config::default()).is_err());
    }
}
