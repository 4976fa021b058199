mod machine;

use serde::Serialize;

use crate::age::AgeBand;
use crate::domain::{
    AnalysisResult, CareerPath, Conclusion, Mission, RealWorldPlan, StoryChoice, StoryStep,
};

pub use machine::{
    transition, SessionEvent, StageFailure, StageOutcome, StageRequest, Transition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Stage {
    #[default]
    AgeInput,
    DreamInput,
    Analyzing,
    Results,
    Simulating,
    InStory,
    MissionLoading,
    InMission,
    Concluding,
    PlannerLoading,
    PlanDisplay,
    Error,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::AgeInput => "AgeInput",
            Self::DreamInput => "DreamInput",
            Self::Analyzing => "Analyzing",
            Self::Results => "Results",
            Self::Simulating => "Simulating",
            Self::InStory => "InStory",
            Self::MissionLoading => "MissionLoading",
            Self::InMission => "InMission",
            Self::Concluding => "Concluding",
            Self::PlannerLoading => "PlannerLoading",
            Self::PlanDisplay => "PlanDisplay",
            Self::Error => "Error",
        }
    }

    /// Default user-facing message when a call issued from this stage fails without one.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Analyzing => "Analysis failed.",
            Self::Simulating => "Could not start the simulation.",
            Self::MissionLoading => "Could not create a mini-mission.",
            Self::Concluding => "Could not get the simulation conclusion.",
            Self::PlannerLoading => "Could not generate your action plan.",
            _ => "Something went wrong.",
        }
    }
}

/// The whole interactive session. Transitions replace it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub age: Option<u8>,
    pub analysis: Option<AnalysisResult>,
    pub selected_career: Option<CareerPath>,
    pub story_step: Option<StoryStep>,
    pub user_choice: Option<StoryChoice>,
    pub mission: Option<Mission>,
    pub conclusion: Option<Conclusion>,
    pub plan: Option<RealWorldPlan>,
    pub stage: Stage,
    pub last_error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn age_band(&self) -> Option<AgeBand> {
        self.age.map(AgeBand::for_age)
    }

    pub fn theme(&self) -> &'static str {
        self.age_band()
            .map(AgeBand::theme)
            .unwrap_or("theme-default")
    }

    /// True while a stage-advancing call is in flight.
    pub fn is_pending(&self) -> bool {
        match self.stage {
            Stage::Analyzing
            | Stage::Simulating
            | Stage::MissionLoading
            | Stage::PlannerLoading => true,
            Stage::Concluding => self.conclusion.is_none(),
            _ => false,
        }
    }

    pub fn loading_message(&self) -> Option<&'static str> {
        if !self.is_pending() {
            return None;
        }
        Some(match self.stage {
            Stage::Analyzing => "Analyzing your brilliant dream...",
            Stage::MissionLoading => "Preparing your mission...",
            Stage::PlannerLoading => "Building your real-world plan...",
            _ => "Building your next adventure...",
        })
    }

    pub fn traits(&self) -> &[String] {
        self.analysis
            .as_ref()
            .map(|analysis| analysis.traits.as_slice())
            .unwrap_or(&[])
    }
}
