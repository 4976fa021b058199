use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    api_base_from_env, non_empty_env, response_json_or_error, AspectRatio, GeneratedImage,
    ImageGenerator, ProviderError,
};

const PROVIDER: &str = "Imagen";

pub struct ImagenProvider {
    model: String,
    api_base: String,
    timeout: Duration,
    http: HttpClient,
}

impl ImagenProvider {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            model: Self::resolve_model_name(model),
            api_base: api_base_from_env(&["IMAGEN_API_BASE", "GEMINI_API_BASE"]),
            timeout,
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("IMAGEN_API_KEY")
            .or_else(|| non_empty_env("GEMINI_API_KEY"))
            .or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn resolve_model_name(raw_model: &str) -> String {
        let trimmed = raw_model.trim().trim_start_matches("models/").to_string();
        match trimmed.to_ascii_lowercase().as_str() {
            "imagen-3" | "imagen-3.0" => "imagen-3.0-generate-002".to_string(),
            "imagen-4" | "imagen-4.0" => "imagen-4.0-generate-001".to_string(),
            _ => trimmed,
        }
    }

    pub(crate) fn build_payload(prompt: &str, aspect: AspectRatio) -> Value {
        json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": aspect.ratio(),
                "outputOptions": { "mimeType": "image/png" },
            },
        })
    }

    /// First prediction that carries image bytes.
    pub(crate) fn extract_image(response_payload: &Value) -> Result<GeneratedImage, ProviderError> {
        let predictions = response_payload
            .get("predictions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for row in predictions {
            let Some(obj) = row.as_object() else {
                continue;
            };
            let Some(encoded) = obj
                .get("bytesBase64Encoded")
                .or_else(|| obj.get("bytes_base64_encoded"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let bytes = BASE64.decode(encoded.as_bytes()).map_err(|err| {
                ProviderError::InvalidResponse {
                    provider: PROVIDER,
                    reason: format!("image base64 decode failed: {err}"),
                }
            })?;
            let mime_type = obj
                .get("mimeType")
                .or_else(|| obj.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string();
            return Ok(GeneratedImage { bytes, mime_type });
        }
        Err(ProviderError::InvalidResponse {
            provider: PROVIDER,
            reason: "no images returned".to_string(),
        })
    }
}

impl ImageGenerator for ImagenProvider {
    fn name(&self) -> &str {
        "imagen"
    }

    fn generate_image(
        &self,
        prompt: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, ProviderError> {
        let Some(api_key) = Self::api_key() else {
            return Err(ProviderError::MissingApiKey {
                provider: PROVIDER,
                hint: "IMAGEN_API_KEY, GEMINI_API_KEY or GOOGLE_API_KEY",
            });
        };
        let endpoint = format!("{}/models/{}:predict", self.api_base, self.model);
        debug!(endpoint = %endpoint, aspect = aspect.ratio(), "sending image request");
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&Self::build_payload(prompt, aspect))
            .send()
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;
        let payload = response_json_or_error(PROVIDER, response)?;
        Self::extract_image(&payload)
    }
}
