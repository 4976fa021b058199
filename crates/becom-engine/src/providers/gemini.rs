use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    api_base_from_env, non_empty_env, response_json_or_error, ContentPart, ProviderError,
    StructuredRequest, TextGenerator,
};

const PROVIDER: &str = "Gemini";

/// Schema-constrained JSON generation over `models/{model}:generateContent`.
pub struct GeminiTextProvider {
    model: String,
    api_base: String,
    timeout: Duration,
    http: HttpClient,
}

impl GeminiTextProvider {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            model: model.trim().to_string(),
            api_base: api_base_from_env(&["GEMINI_API_BASE"]),
            timeout,
            http: HttpClient::new(),
        }
    }

    fn api_key() -> Option<String> {
        non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
    }

    fn endpoint(&self) -> String {
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    pub(crate) fn build_payload(request: &StructuredRequest) -> Value {
        let parts: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => json!({ "text": text }),
                ContentPart::InlineImage { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": BASE64.encode(data),
                    }
                }),
            })
            .collect();
        json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_directive }],
            },
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.contract.to_response_schema(),
                "temperature": request.temperature,
            },
        })
    }

    /// Concatenated text of the first candidate's parts.
    pub(crate) fn extract_text(response_payload: &Value) -> Result<String, ProviderError> {
        let parts = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        if text.trim().is_empty() {
            let reason = response_payload
                .get("promptFeedback")
                .and_then(|feedback| feedback.get("blockReason"))
                .and_then(Value::as_str)
                .map(|reason| format!("empty response (blocked: {reason})"))
                .unwrap_or_else(|| "empty response".to_string());
            return Err(ProviderError::InvalidResponse {
                provider: PROVIDER,
                reason,
            });
        }
        Ok(text)
    }
}

impl TextGenerator for GeminiTextProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &StructuredRequest) -> Result<String, ProviderError> {
        let Some(api_key) = Self::api_key() else {
            return Err(ProviderError::MissingApiKey {
                provider: PROVIDER,
                hint: "GEMINI_API_KEY or GOOGLE_API_KEY",
            });
        };
        let endpoint = self.endpoint();
        debug!(
            endpoint = %endpoint,
            contract = request.contract.name(),
            parts = request.parts.len(),
            "sending structured generation request"
        );
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&Self::build_payload(request))
            .send()
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;
        let payload = response_json_or_error(PROVIDER, response)?;
        Self::extract_text(&payload)
    }
}
