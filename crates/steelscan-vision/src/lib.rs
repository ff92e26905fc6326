//! Vision module - the analysis gateway
//!
//! Everything behind [`AnalysisGateway`] is opaque to the rest of the
//! application: images and branding go in, a [`RawAnalysis`] or a
//! [`GatewayError`] comes out.

pub mod ai;

pub use ai::gemini::{AnalyzerConfig, GeminiGateway};
pub use ai::prompts::{build_analysis_prompt, Branding};

use async_trait::async_trait;
use steelscan_types::{ColorPaletteEntry, GatewayError, ImagePayload, RawAnalysis};

/// Input for one analysis: one image, or several angles of one building
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub images: Vec<ImagePayload>,
    pub palette: Vec<ColorPaletteEntry>,
    pub brand_name: String,
    pub brand_phone: String,
    pub configurator_url: String,
}

/// External analysis model.
///
/// Any failure (transport, quota, malformed output) is a rejection; callers
/// treat all of them the same way.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<RawAnalysis, GatewayError>;
}

/// Parse model output into a raw analysis
pub fn parse_response(response: &str) -> Result<RawAnalysis, GatewayError> {
    let json_str = extract_json_from_response(response);
    if json_str.trim().is_empty() {
        return Err(GatewayError::Empty);
    }
    serde_json::from_str(&json_str).map_err(|e| GatewayError::Malformed(e.to_string()))
}

/// Extract JSON from response (handles markdown code blocks)
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    if response.starts_with("```") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').map(|i| i + 1).unwrap_or(3);
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if start < end {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::VariableValue;

    #[test]
    fn test_extract_json_markdown() {
        let response = "```json\n{\"test\": 123}\n```";
        assert_eq!(extract_json_from_response(response), "{\"test\": 123}");
    }

    #[test]
    fn test_extract_json_plain() {
        let response = "{\"test\": 123}";
        assert_eq!(extract_json_from_response(response), "{\"test\": 123}");
    }

    #[test]
    fn test_extract_json_with_text() {
        let response = "Here is the result: {\"test\": 123} end";
        assert_eq!(extract_json_from_response(response), "{\"test\": 123}");
    }

    #[test]
    fn test_parse_response() {
        let raw = parse_response(
            "```json\n{\"sku\":\"SB-1\",\"variables\":{\"width\":{\"value\":30,\"thought\":\"\"}}}\n```",
        )
        .unwrap();
        assert_eq!(raw.sku, "SB-1");
        assert_eq!(
            raw.variables.width.map(|w| w.value),
            Some(VariableValue::Number(30.0))
        );
    }

    #[test]
    fn test_parse_response_null_variables() {
        let raw = parse_response("{\"sku\":\"SB-1\",\"variables\":null}").unwrap();
        assert_eq!(raw.sku, "SB-1");
        assert!(raw.variables.width.is_none());
        assert!(raw.variables.pitch.is_none());
    }

    #[test]
    fn test_parse_response_errors() {
        assert_eq!(parse_response("   "), Err(GatewayError::Empty));
        assert!(matches!(
            parse_response("{\"sku\": [}"),
            Err(GatewayError::Malformed(_))
        ));
    }
}
