use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TranslateConfig;
use crate::device::Device;
use crate::error::{Result, SubtranError};
use super::{DecodingOptions, TranslationBackend};

#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    pub parameters: InferenceParameters<'a>,
    pub options: InferenceOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceParameters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_lang: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tgt_lang: Option<&'a str>,
    pub generate_parameters: GenerateParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateParameters {
    pub num_beams: u32,
    pub length_penalty: f32,
    pub max_length: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceOptions {
    pub wait_for_model: bool,
}

/// Device hint for self-hosted servers; the hosted Inference API ignores it
pub const DEVICE_HEADER: &str = "x-device";

#[derive(Debug, Clone, Deserialize)]
struct InferenceOutput {
    translation_text: Option<String>,
    generated_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<InferenceOutput>),
    // Must precede Single, which accepts any object
    Error { error: String },
    Single(InferenceOutput),
}

/// Seq2seq model served through a Hugging Face Inference API compatible endpoint
pub struct HuggingFaceBackend {
    client: Client,
    config: TranslateConfig,
    device: Device,
    token: Option<String>,
}

impl HuggingFaceBackend {
    pub fn new(config: TranslateConfig, device: Device) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let token = config
            .api_token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            config,
            device,
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check the model status on the endpoint.
    ///
    /// A 404 is not fatal: servers without a status route are checked by the
    /// first translation request instead.
    pub async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/status/{}", self.config.endpoint(), self.config.model);
        debug!("Checking model availability at: {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SubtranError::ModelLoad(format!("Failed to reach model server: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            warn!("No model status route at {}, continuing", url);
            Ok(())
        } else {
            Err(SubtranError::ModelLoad(format!(
                "Model '{}' not available at {} (status {})",
                self.config.model,
                self.config.endpoint(),
                status
            )))
        }
    }
}

#[async_trait]
impl TranslationBackend for HuggingFaceBackend {
    async fn translate(&self, text: &str, options: &DecodingOptions) -> Result<String> {
        let request = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                src_lang: self.config.source_language.as_deref(),
                tgt_lang: self.config.target_language.as_deref(),
                generate_parameters: GenerateParameters {
                    num_beams: options.num_beams,
                    length_penalty: options.length_penalty,
                    max_length: options.max_length,
                },
            },
            options: InferenceOptions { wait_for_model: true },
        };

        let url = format!("{}/models/{}", self.config.endpoint(), self.config.model);
        debug!("Sending translation request to: {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .header(DEVICE_HEADER, self.device.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtranError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtranError::Translation(format!(
                "Model server error {}: {}", status, error_text
            )));
        }

        let parsed: InferenceResponse = response.json().await
            .map_err(|e| SubtranError::Translation(format!("Failed to parse response: {}", e)))?;

        let output = match parsed {
            InferenceResponse::Batch(outputs) => outputs.into_iter().next(),
            InferenceResponse::Single(output) => Some(output),
            InferenceResponse::Error { error } => {
                return Err(SubtranError::Translation(format!("Model server error: {}", error)));
            }
        };

        let translation = output
            .and_then(|o| o.translation_text.or(o.generated_text))
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if translation.is_empty() {
            return Err(SubtranError::Translation("Empty translation received".to_string()));
        }

        Ok(translation)
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
