// src/services/llm_service.rs
use crate::config::Config;
use crate::errors::ScannerError;
use crate::models::*;
use crate::services::code_analyzer::CodeAnalyzer;
use crate::services::prompt::{
    DESIGN_SYSTEM_PROMPT, build_prompt, extract_code_from_response, extract_design_tokens,
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use log::debug;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANALYSIS_MAX_TOKENS: u32 = 4000;
const DESIGN_MAX_TOKENS: u32 = 1000;

/// One multimodal call: an image plus a text prompt, answered with free text.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub image: Vec<u8>,
    pub media_type: String,
    pub prompt: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(&self, request: VisionRequest) -> Result<String, ScannerError>;
}

pub struct AnthropicClient {
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: &Config) -> Result<Self, ScannerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .map_err(|e| ScannerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.anthropic_api_key.clone(),
            model: config.anthropic_model.clone(),
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.ai_timeout_secs,
            client,
        })
    }
}

#[async_trait]
impl VisionModel for AnthropicClient {
    async fn complete(&self, request: VisionRequest) -> Result<String, ScannerError> {
        let start = Instant::now();
        let base64_image = general_purpose::STANDARD.encode(&request.image);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": request.max_tokens,
                "temperature": 0,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": request.media_type,
                                "data": base64_image
                            }
                        },
                        {
                            "type": "text",
                            "text": request.prompt
                        }
                    ]
                }]
            }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScannerError::AiAnalysis(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ScannerError::AiTimeout(self.timeout_secs)
            } else {
                ScannerError::AiAnalysis(format!("Failed to parse Anthropic response: {}", e))
            }
        })?;

        debug!(
            "Anthropic call finished in {}ms",
            start.elapsed().as_millis()
        );

        Ok(result["content"][0]["text"]
            .as_str()
            .unwrap_or("No response generated")
            .to_string())
    }
}

impl AnthropicClient {
    fn transport_error(&self, e: reqwest::Error) -> ScannerError {
        if e.is_timeout() {
            ScannerError::AiTimeout(self.timeout_secs)
        } else {
            ScannerError::AiAnalysis(format!("Anthropic request failed: {}", e))
        }
    }
}

pub struct LLMService {
    model: Arc<dyn VisionModel>,
    analyzer: CodeAnalyzer,
}

impl LLMService {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model,
            analyzer: CodeAnalyzer::new(),
        }
    }

    pub fn analyze_code(&self, react_code: &str) -> CodeAnalysis {
        self.analyzer.analyze(react_code)
    }

    /// Sends the screenshot and component source to the model and pulls the
    /// suggested code out of the reply. No retries.
    pub async fn analyze_ui(
        &self,
        image: &NormalizedImage,
        react_code: &str,
        analysis: CodeAnalysis,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult, ScannerError> {
        let analysis_type = options.resolved_type();
        let include_explanation = options.include_explanation.unwrap_or(true);
        let prompt = build_prompt(react_code, &analysis, analysis_type, include_explanation);

        let full_response = self
            .model
            .complete(VisionRequest {
                image: image.data.clone(),
                media_type: image.media_type.to_string(),
                prompt,
                max_tokens: ANALYSIS_MAX_TOKENS,
            })
            .await?;

        let fixed_code = extract_code_from_response(&full_response);

        Ok(AnalysisResult {
            fixed_code: Some(fixed_code),
            full_response,
            suggestions: self.analyzer.suggest_improvements(&analysis),
            warnings: self.analyzer.validate_jsx_syntax(react_code),
            component_tree: self.analyzer.extract_component_tree(react_code),
            analysis,
            analysis_type,
        })
    }

    pub async fn analyze_design_system(
        &self,
        image: &NormalizedImage,
    ) -> Result<DesignTokens, ScannerError> {
        let response = self
            .model
            .complete(VisionRequest {
                image: image.data.clone(),
                media_type: image.media_type.to_string(),
                prompt: DESIGN_SYSTEM_PROMPT.to_string(),
                max_tokens: DESIGN_MAX_TOKENS,
            })
            .await?;

        Ok(extract_design_tokens(&response))
    }
}
