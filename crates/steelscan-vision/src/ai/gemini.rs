//! Gemini generateContent backend

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use steelscan_types::{GatewayError, RawAnalysis};
use tracing::{debug, info};

use super::prompts::{build_analysis_prompt, Branding};
use crate::{parse_response, AnalysisGateway, AnalysisRequest};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Gateway backed by the Gemini REST API
pub struct GeminiGateway {
    config: AnalyzerConfig,
    client: Client,
}

impl GeminiGateway {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn request_body(request: &AnalysisRequest) -> Value {
        let branding = Branding {
            brand_name: request.brand_name.clone(),
            brand_phone: request.brand_phone.clone(),
            configurator_url: request.configurator_url.clone(),
        };
        let prompt = build_analysis_prompt(&request.palette, &branding, request.images.len());

        let mut parts: Vec<Value> = request
            .images
            .iter()
            .map(|image| {
                json!({
                    "inline_data": {
                        "mime_type": image.mime_type(),
                        "data": image.base64_data(),
                    }
                })
            })
            .collect();
        parts.push(json!({ "text": prompt }));

        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }
}

/// Concatenated text of the first candidate
fn candidate_text(response: &Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl AnalysisGateway for GeminiGateway {
    async fn analyze(&self, request: AnalysisRequest) -> Result<RawAnalysis, GatewayError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GatewayError::MissingCredentials)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        info!(model = %self.config.model, images = request.images.len(), "sending analysis request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let text = candidate_text(&body).ok_or(GatewayError::Empty)?;
        debug!(chars = text.len(), "analysis response received");

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::{default_palette, ImagePayload};

    #[test]
    fn test_request_body_has_images_then_prompt() {
        let request = AnalysisRequest {
            images: vec![
                ImagePayload::from_base64("image/png", "AAAA"),
                ImagePayload::new("BBBB"),
            ],
            palette: default_palette(),
            brand_name: "Ironclad".to_string(),
            brand_phone: "555".to_string(),
            configurator_url: "https://x".to_string(),
        };
        let body = GeminiGateway::request_body(&request);
        let parts = body["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "BBBB");
        assert!(parts[2]["text"].as_str().unwrap().contains("Ironclad"));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"sku\":" }, { "text": "\"A\"}" }] } }]
        });
        assert_eq!(candidate_text(&body).as_deref(), Some("{\"sku\":\"A\"}"));
        assert_eq!(candidate_text(&json!({ "candidates": [] })), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected() {
        let gateway = GeminiGateway::new(AnalyzerConfig::default());
        let request = AnalysisRequest {
            images: vec![ImagePayload::new("AAAA")],
            ..Default::default()
        };
        let err = gateway.analyze(request).await.unwrap_err();
        assert_eq!(err, GatewayError::MissingCredentials);
    }
}
