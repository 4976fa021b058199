use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use becom_contracts::domain::{
    AnalysisResult, Conclusion, CreativeInput, Mission, RealWorldPlan, RoundResult, StoryStep,
};
use becom_contracts::schema::SchemaViolation;
use indexmap::IndexMap;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::fetcher::ImageFetcher;
use crate::mission::MissionDesign;
use crate::plan;
use crate::prompts;
use crate::providers::{AspectRatio, ProviderError, StructuredRequest, TextGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AnalyzeDream,
    StartSimulation,
    GenerateMission,
    MissionFeedback,
    RealWorldPlan,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::AnalyzeDream => "analyze_dream",
            Self::StartSimulation => "start_simulation",
            Self::GenerateMission => "generate_mission",
            Self::MissionFeedback => "mission_feedback",
            Self::RealWorldPlan => "real_world_plan",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{operation} response violated its contract")]
    SchemaViolation {
        operation: Operation,
        career: String,
        #[source]
        source: SchemaViolation,
    },
    #[error("{operation} response could not be parsed")]
    Parse {
        operation: Operation,
        career: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation} generation call failed")]
    Provider {
        operation: Operation,
        career: String,
        #[source]
        source: ProviderError,
    },
}

impl GenerationError {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::InvalidInput(_) => None,
            Self::SchemaViolation { operation, .. }
            | Self::Parse { operation, .. }
            | Self::Provider { operation, .. } => Some(*operation),
        }
    }

    /// Message shown to the user; the underlying cause only goes to the logs.
    pub fn user_message(&self) -> String {
        let (operation, career) = match self {
            Self::InvalidInput(message) => return message.clone(),
            Self::SchemaViolation {
                operation, career, ..
            }
            | Self::Parse {
                operation, career, ..
            }
            | Self::Provider {
                operation, career, ..
            } => (*operation, career),
        };
        match operation {
            Operation::AnalyzeDream => "Failed to get analysis from Becom.AI.".to_string(),
            Operation::StartSimulation => {
                format!("Failed to start a story about being a {career}.")
            }
            Operation::GenerateMission => format!("Failed to create a mini-mission for a {career}."),
            Operation::MissionFeedback => format!("Failed to conclude the story for a {career}."),
            Operation::RealWorldPlan => {
                format!("Failed to create a real-world plan for a {career}.")
            }
        }
    }
}

/// The five generation operations behind the session stages.
///
/// Text calls go through a [`TextGenerator`] and are validated against the call's
/// contract before decoding. Illustrations go through an [`ImageFetcher`], which never
/// fails, so a missing picture never fails a stage.
pub struct ContentGenerationService {
    text: Arc<dyn TextGenerator>,
    images: ImageFetcher,
    inter_call_delay: Duration,
}

impl ContentGenerationService {
    pub fn new(text: Arc<dyn TextGenerator>, images: ImageFetcher, inter_call_delay: Duration) -> Self {
        Self {
            text,
            images,
            inter_call_delay,
        }
    }

    pub fn text_backend(&self) -> &str {
        self.text.name()
    }

    pub fn analyze_dream(
        &self,
        input: &CreativeInput,
        age: u8,
    ) -> Result<AnalysisResult, GenerationError> {
        if input.is_empty() {
            return Err(GenerationError::InvalidInput(
                "No input provided for analysis.".to_string(),
            ));
        }
        let operation = Operation::AnalyzeDream;
        let mut analysis: AnalysisResult = self.structured(
            operation,
            "",
            prompts::analysis_request(input, age),
        )?;
        for career in analysis.career_paths.iter_mut() {
            career.image_url = self.images.fetch(
                &prompts::career_illustration(&career.name, age),
                AspectRatio::Wide,
            );
            self.pause_between_calls();
        }
        info!(
            careers = analysis.career_paths.len(),
            traits = analysis.traits.len(),
            "dream analyzed"
        );
        Ok(analysis)
    }

    pub fn start_simulation(&self, career: &str, age: u8) -> Result<StoryStep, GenerationError> {
        let mut step: StoryStep = self.structured(
            Operation::StartSimulation,
            career,
            prompts::story_request(career, age),
        )?;
        step.image_url = self.images.fetch(
            &prompts::story_illustration(career, age, &step.text),
            AspectRatio::Wide,
        );
        Ok(step)
    }

    pub fn generate_mission<R: Rng + ?Sized>(
        &self,
        career: &str,
        choice: &str,
        age: u8,
        rng: &mut R,
    ) -> Result<Mission, GenerationError> {
        let design: MissionDesign = self.structured(
            Operation::GenerateMission,
            career,
            prompts::mission_request(career, choice, age),
        )?;
        let mut images = IndexMap::new();
        for object_type in design.distinct_types() {
            let url = self.images.fetch(
                &prompts::object_illustration(&object_type),
                AspectRatio::Square,
            );
            images.insert(object_type, url);
            self.pause_between_calls();
        }
        let mission = design.populate(&images, rng);
        info!(
            title = %mission.title,
            object_types = images.len(),
            "mission ready"
        );
        Ok(mission)
    }

    pub fn mission_feedback(
        &self,
        career: &str,
        choice: &str,
        results: &[RoundResult],
        age: u8,
    ) -> Result<Conclusion, GenerationError> {
        let mut conclusion: Conclusion = self.structured(
            Operation::MissionFeedback,
            career,
            prompts::feedback_request(career, choice, results, age),
        )?;
        let reported = std::mem::take(&mut conclusion.unlocked_skills);
        conclusion.unlocked_skills = earned_skills(reported, results);
        conclusion.image_url = self.images.fetch(
            &prompts::conclusion_illustration(career, age, &conclusion.narrative_text),
            AspectRatio::Wide,
        );
        Ok(conclusion)
    }

    pub fn real_world_plan(
        &self,
        career: &str,
        traits: &[String],
        age: u8,
    ) -> Result<RealWorldPlan, GenerationError> {
        let mut plan: RealWorldPlan = self.structured(
            Operation::RealWorldPlan,
            career,
            prompts::plan_request(career, traits, age),
        )?;
        plan::attach_icons(&mut plan.growth_map, &self.images);
        plan::rewrite_khan_urls(&mut plan.course_suggestions);
        Ok(plan)
    }

    fn pause_between_calls(&self) {
        self.images.pacer().pause(self.inter_call_delay);
    }

    fn structured<T: DeserializeOwned>(
        &self,
        operation: Operation,
        career: &str,
        request: StructuredRequest,
    ) -> Result<T, GenerationError> {
        let result = self.request_structured(operation, career, &request);
        if let Err(err) = &result {
            error!(operation = operation.name(), error = %error_chain(err), "generation failed");
        }
        result
    }

    fn request_structured<T: DeserializeOwned>(
        &self,
        operation: Operation,
        career: &str,
        request: &StructuredRequest,
    ) -> Result<T, GenerationError> {
        info!(
            operation = operation.name(),
            backend = self.text.name(),
            contract = request.contract.name(),
            "requesting structured generation"
        );
        let raw = self
            .text
            .generate(request)
            .map_err(|source| GenerationError::Provider {
                operation,
                career: career.to_string(),
                source,
            })?;
        let value: Value =
            serde_json::from_str(raw.trim()).map_err(|source| GenerationError::Parse {
                operation,
                career: career.to_string(),
                source,
            })?;
        request
            .contract
            .validate(&value)
            .map_err(|source| GenerationError::SchemaViolation {
                operation,
                career: career.to_string(),
                source,
            })?;
        serde_json::from_value(value).map_err(|source| GenerationError::Parse {
            operation,
            career: career.to_string(),
            source,
        })
    }
}

/// Keeps only skills from rounds that succeeded, in reported order, without repeats.
/// Matching ignores case and surrounding whitespace; the round's own label is kept.
pub fn earned_skills(reported: Vec<String>, results: &[RoundResult]) -> Vec<String> {
    let mut earned: Vec<String> = Vec::new();
    for skill in reported {
        let wanted = skill.trim().to_lowercase();
        let matched = results
            .iter()
            .filter(|result| result.success)
            .find(|result| result.skill_label.trim().to_lowercase() == wanted);
        match matched {
            Some(result) => {
                if !earned.contains(&result.skill_label) {
                    earned.push(result.skill_label.clone());
                }
            }
            None => warn!(skill = %skill, "dropping skill not earned in a successful round"),
        }
    }
    earned
}

pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(next) = source {
        parts.push(next.to_string());
        source = next.source();
    }
    parts.join(": ")
}
