use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, SubtranError};
use super::{DecodingOptions, TranslationBackend};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TranslationResult {
    text: String,
}

/// Translation through an LLM hosted by a local Ollama server
pub struct OllamaBackend {
    client: Client,
    config: TranslateConfig,
}

impl OllamaBackend {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Check if Ollama is running and the model is pulled
    pub async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.config.endpoint());

        let response = self.client
            .post(&url)
            .json(&json!({ "name": self.config.model }))
            .send()
            .await
            .map_err(|e| SubtranError::ModelLoad(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(SubtranError::ModelLoad(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.config.model, self.config.model
            )))
        }
    }

    fn build_prompt(&self, text: &str) -> String {
        let target = self.config.target_language.as_deref().unwrap_or("en");
        let language_name = language_code_to_name(target);

        let mut prompt = format!(
            "You are a professional subtitle translator.\n\
             \n\
             Translate the subtitle text to {} ONLY. Keep line breaks where they are.\n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n",
            language_name, language_name
        );

        if let Some(source) = self.config.source_language.as_deref() {
            prompt.push_str(&format!("The source language is {}.\n", language_code_to_name(source)));
        }

        prompt.push_str(&format!("\n[Text to translate]\n{}\n", text));
        prompt
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn translate(&self, text: &str, options: &DecodingOptions) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: self.build_prompt(text),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions {
                num_predict: options.max_length,
                temperature: 0.0,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint());
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtranError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtranError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| SubtranError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim();
        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(SubtranError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            let text = result.text.trim();
            if text.is_empty() {
                return Err(SubtranError::Translation("Empty translation received".to_string()));
            }
            return Ok(text.to_string());
        }

        Ok(clean_translation_response(raw_response))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Language name for prompts; accepts ISO 639-1 codes and NLLB-style codes like `fra_Latn`
fn language_code_to_name(code: &str) -> String {
    let base = code.split(['_', '-']).next().unwrap_or(code).to_lowercase();
    let name = match base.as_str() {
        "en" | "eng" => "English",
        "ja" | "jpn" => "Japanese",
        "ko" | "kor" => "Korean",
        "zh" | "zho" => "Chinese",
        "fr" | "fra" => "French",
        "de" | "deu" => "German",
        "es" | "spa" => "Spanish",
        "ru" | "rus" => "Russian",
        "it" | "ita" => "Italian",
        "pt" | "por" => "Portuguese",
        "pl" | "pol" => "Polish",
        "nl" | "nld" => "Dutch",
        "tr" | "tur" => "Turkish",
        "ar" | "arb" => "Arabic",
        "hi" | "hin" => "Hindi",
        "th" | "tha" => "Thai",
        "vi" | "vie" => "Vietnamese",
        "sv" | "swe" => "Swedish",
        "uk" | "ukr" => "Ukrainian",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// Pull the translation out of a response that ignored the JSON format request
fn clean_translation_response(response: &str) -> String {
    let kept: Vec<&str> = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            !(line.starts_with("Here is")
                || line.starts_with("Here are")
                || line.starts_with("Translation:")
                || (line.starts_with("**") && line.ends_with("**")))
        })
        .collect();

    if kept.is_empty() {
        return response.trim().trim_matches('"').to_string();
    }
    kept.join("\n").trim_matches('"').to_string()
}
