use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Content identity of one input photograph. Identity is stable for the
/// lifetime of the process: a storage URI, or the sha256 of raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    identity: String,
    uri: Option<String>,
    bytes: Option<Vec<u8>>,
}

impl ImageRef {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            identity: uri.clone(),
            uri: Some(uri),
            bytes: None,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let digest = Sha256::digest(&bytes);
        Self {
            identity: hex::encode(digest),
            uri: None,
            bytes: Some(bytes),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// URL form usable in a vision request: the original URI, or a base64
    /// data URL when only bytes are held.
    pub fn payload_url(&self) -> String {
        if let Some(uri) = &self.uri {
            return uri.clone();
        }
        let encoded = self
            .bytes
            .as_deref()
            .map(|bytes| BASE64.encode(bytes))
            .unwrap_or_default();
        format!("data:image/jpeg;base64,{encoded}")
    }
}

/// External vision capability: given an image and a textual instruction,
/// returns a semi-structured description. The reply carries no schema
/// guarantee and is parsed defensively by the analyzer.
pub trait VisionProvider: Send + Sync {
    fn name(&self) -> &str;
    fn describe(&self, image: &ImageRef, instruction: &str) -> Result<Value>;
}

/// Chat-completions style HTTP vision provider.
pub struct HttpVisionProvider {
    client: HttpClient,
    endpoint: String,
    model: String,
}

impl HttpVisionProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: HttpClient::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn api_key() -> Option<String> {
        std::env::var("RESTYLE_VISION_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }

    fn build_payload(&self, image: &ImageRef, instruction: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": instruction},
                    {"type": "image_url", "image_url": {"url": image.payload_url()}},
                ],
            }],
            "response_format": {"type": "json_object"},
        })
    }

    fn extract_content(payload: &Value) -> Option<Value> {
        let content = payload
            .get("choices")?
            .as_array()?
            .first()?
            .get("message")?
            .get("content")?;
        Some(content.clone())
    }
}

impl VisionProvider for HttpVisionProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn describe(&self, image: &ImageRef, instruction: &str) -> Result<Value> {
        let Some(api_key) = Self::api_key() else {
            bail!("missing vision API key (set RESTYLE_VISION_API_KEY or OPENAI_API_KEY)");
        };
        let payload = self.build_payload(image, instruction);
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .with_context(|| format!("vision request failed ({})", self.endpoint))?;

        let status = response.status();
        let body: Value = response
            .json()
            .with_context(|| format!("vision response was not JSON ({})", self.endpoint))?;
        if !status.is_success() {
            bail!("vision request returned HTTP {}: {}", status.as_u16(), body);
        }

        match Self::extract_content(&body) {
            Some(content) => Ok(content),
            None => bail!("vision response missing message content"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_from_bytes_uses_sha256_identity() {
        let image = ImageRef::from_bytes(vec![1, 2, 3]);
        assert_eq!(image.identity().len(), 64);
        assert_eq!(image.identity(), ImageRef::from_bytes(vec![1, 2, 3]).identity());
        assert_ne!(image.identity(), ImageRef::from_bytes(vec![4]).identity());
    }

    #[test]
    fn image_ref_payload_url_prefers_uri() {
        let image = ImageRef::from_uri("https://cdn.example/room.jpg");
        assert_eq!(image.payload_url(), "https://cdn.example/room.jpg");
        assert_eq!(image.identity(), "https://cdn.example/room.jpg");

        let image = ImageRef::from_bytes(vec![0xff]);
        assert!(image.payload_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn build_payload_embeds_instruction_and_image() {
        let provider = HttpVisionProvider::new("https://api.example/v1/chat", "vision-1");
        let image = ImageRef::from_uri("https://cdn.example/room.jpg");
        let payload = provider.build_payload(&image, "describe this");
        assert_eq!(payload["model"], "vision-1");
        let content = payload["messages"][0]["content"]
            .as_array()
            .expect("content array");
        assert_eq!(content[0]["text"], "describe this");
        assert_eq!(
            content[1]["image_url"]["url"],
            "https://cdn.example/room.jpg"
        );
    }

    #[test]
    fn extract_content_reads_first_choice() {
        let body = json!({
            "choices": [{"message": {"content": "{\"spaceType\": \"interior\"}"}}],
        });
        assert_eq!(
            HttpVisionProvider::extract_content(&body),
            Some(Value::String("{\"spaceType\": \"interior\"}".to_string()))
        );
        assert_eq!(HttpVisionProvider::extract_content(&json!({})), None);
    }
}
