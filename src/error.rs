use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtranError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Malformed subtitle block #{position}: {content:?}")]
    MalformedBlock { position: usize, content: String },
}

pub type Result<T> = std::result::Result<T, SubtranError>;
