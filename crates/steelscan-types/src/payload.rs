use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_MIME: &str = "image/jpeg";

/// Encoded image as a `data:<mime>;base64,<data>` URL.
///
/// Immutable once created; cloning copies the encoded string.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    /// Build a payload from a mime type and already-encoded base64 data
    pub fn from_base64(mime: &str, data: &str) -> Self {
        Self(format!("data:{};base64,{}", mime, data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mime type from the data-URL header, `image/jpeg` when absent
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split(|c: char| c == ';' || c == ',').next())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME)
    }

    /// Base64 part after the comma; the whole string if there is no header
    pub fn base64_data(&self) -> &str {
        match self.0.split_once(',') {
            Some((_, data)) => data,
            None => &self.0,
        }
    }
}

// Payloads are megabytes of base64; keep debug output readable.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.chars().take(32).collect();
        write!(f, "ImagePayload({}… {} bytes)", head, self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_parts() {
        let payload = ImagePayload::from_base64("image/png", "AAAA");
        assert_eq!(payload.as_str(), "data:image/png;base64,AAAA");
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.base64_data(), "AAAA");
    }

    #[test]
    fn test_bare_base64_defaults_to_jpeg() {
        let payload = ImagePayload::new("AAAA");
        assert_eq!(payload.mime_type(), "image/jpeg");
        assert_eq!(payload.base64_data(), "AAAA");
    }
}
