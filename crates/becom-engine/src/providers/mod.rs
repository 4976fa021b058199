mod dryrun;
mod gemini;
mod imagen;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use becom_contracts::models::ModelSpec;
use becom_contracts::schema::SchemaContract;
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

pub use dryrun::{DryrunImageProvider, DryrunTextProvider};
pub use gemini::GeminiTextProvider;
pub use imagen::ImagenProvider;

pub(crate) const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Wide,
    Square,
}

impl AspectRatio {
    pub fn ratio(self) -> &'static str {
        match self {
            Self::Wide => "16:9",
            Self::Square => "1:1",
        }
    }

    pub(crate) fn dims(self) -> (u32, u32) {
        match self {
            Self::Wide => (64, 36),
            Self::Square => (48, 48),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// One schema-constrained generation call.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_directive: String,
    pub parts: Vec<ContentPart>,
    pub contract: SchemaContract,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API key not set ({hint})")]
    MissingApiKey {
        provider: &'static str,
        hint: &'static str,
    },
    #[error("{provider} request failed ({status}): {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} request failed")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned an unusable response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    /// Quota/rate-limit failures are the only transient class.
    pub fn is_rate_limited(&self) -> bool {
        if let Self::Http { status: 429, .. } = self {
            return true;
        }
        let text = self.to_string();
        text.contains("429") || text.contains("RESOURCE_EXHAUSTED")
    }
}

pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;
    /// Returns the raw JSON text produced for `request`.
    fn generate(&self, request: &StructuredRequest) -> Result<String, ProviderError>;
}

pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate_image(
        &self,
        prompt: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, ProviderError>;
}

pub fn text_generator_for(
    model: &ModelSpec,
    timeout: Duration,
) -> Result<Arc<dyn TextGenerator>> {
    match model.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiTextProvider::new(&model.name, timeout))),
        "dryrun" => Ok(Arc::new(DryrunTextProvider)),
        other => bail!("no text provider registered for '{other}' ({})", model.name),
    }
}

pub fn image_generator_for(
    model: &ModelSpec,
    timeout: Duration,
) -> Result<Arc<dyn ImageGenerator>> {
    match model.provider.as_str() {
        "imagen" => Ok(Arc::new(ImagenProvider::new(&model.name, timeout))),
        "dryrun" => Ok(Arc::new(DryrunImageProvider)),
        other => bail!("no image provider registered for '{other}' ({})", model.name),
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn api_base_from_env(keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| non_empty_env(key))
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| GOOGLE_API_BASE.to_string())
}

pub(crate) fn response_json_or_error(
    provider: &'static str,
    response: HttpResponse,
) -> Result<Value, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|source| ProviderError::Transport { provider, source })?;
    if !status.is_success() {
        return Err(ProviderError::Http {
            provider,
            status: status.as_u16(),
            body: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|err| ProviderError::InvalidResponse {
        provider,
        reason: format!("invalid JSON payload: {err}"),
    })
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
