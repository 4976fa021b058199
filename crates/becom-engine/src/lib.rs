//! Generation engine: providers, image retry, the five content operations and the
//! session driver that connects them to the state machine.

pub mod driver;
pub mod fetcher;
pub mod mission;
pub mod plan;
pub mod prompts;
pub mod providers;
pub mod service;

use std::time::Duration;

use anyhow::Result;
use becom_contracts::models::{Capability, ModelSelection, ModelSelector};
use tracing::{info, warn};

pub use driver::SessionDriver;
pub use fetcher::{ImageFetcher, Pacer, RetryPolicy, ThreadPacer};
pub use service::{ContentGenerationService, GenerationError, Operation};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub request_timeout: Duration,
    pub image_retry: RetryPolicy,
    /// Pause after each image in a sequential batch.
    pub inter_call_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_model: None,
            image_model: None,
            request_timeout: Duration::from_secs(90),
            image_retry: RetryPolicy::default(),
            inter_call_delay: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    /// Both backends offline.
    pub fn dryrun() -> Self {
        Self {
            text_model: Some("dryrun-text-1".to_string()),
            image_model: Some("dryrun-image-1".to_string()),
            inter_call_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Resolves the configured models and wires the providers into a service.
pub fn build_service(config: &EngineConfig) -> Result<ContentGenerationService> {
    let selector = ModelSelector::new(None);
    let text = resolve(&selector, config.text_model.as_deref(), Capability::Text)?;
    let image = resolve(&selector, config.image_model.as_deref(), Capability::Image)?;
    info!(text_model = %text.model.name, image_model = %image.model.name, "models selected");

    let text_backend = providers::text_generator_for(&text.model, config.request_timeout)?;
    let image_backend = providers::image_generator_for(&image.model, config.request_timeout)?;
    let fetcher = ImageFetcher::new(image_backend, config.image_retry.clone());
    Ok(ContentGenerationService::new(
        text_backend,
        fetcher,
        config.inter_call_delay,
    ))
}

fn resolve(
    selector: &ModelSelector,
    requested: Option<&str>,
    capability: Capability,
) -> Result<ModelSelection> {
    let selection = selector.select(requested, capability)?;
    if let (Some(_), Some(reason)) = (requested, selection.fallback_reason.as_deref()) {
        warn!(capability = capability.name(), reason, fallback = %selection.model.name, "model fallback");
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use becom_contracts::domain::CreativeInput;

    use super::*;

    #[test]
    fn dryrun_config_runs_offline() -> Result<()> {
        let service = build_service(&EngineConfig::dryrun())?;
        assert_eq!(service.text_backend(), "dryrun");
        let analysis = service.analyze_dream(&CreativeInput::text("I love robots"), 9)?;
        assert!(!analysis.career_paths.is_empty());
        assert!(analysis
            .career_paths
            .iter()
            .all(|career| career.image_url.starts_with("data:image/png;base64,")));
        Ok(())
    }

    #[test]
    fn unknown_model_falls_back_to_default() -> Result<()> {
        let selector = ModelSelector::new(None);
        let selection = resolve(&selector, Some("nope"), Capability::Image)?;
        assert_eq!(selection.model.name, "imagen-3.0-generate-002");
        Ok(())
    }

    #[test]
    fn default_retry_and_pacing() {
        let config = EngineConfig::default();
        assert_eq!(config.image_retry.max_attempts, 3);
        assert_eq!(config.inter_call_delay, Duration::from_millis(500));
    }
}
