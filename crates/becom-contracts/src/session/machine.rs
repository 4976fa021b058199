use crate::age::{is_supported_age, MAX_AGE, MIN_AGE};
use crate::domain::{
    AnalysisResult, Conclusion, CreativeInput, Mission, RealWorldPlan, RoundResult, StoryStep,
};

use super::{Session, Stage};

/// Failure reported back from a stage's generation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageFailure {
    pub message: String,
}

impl StageFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type StageOutcome<T> = Result<T, StageFailure>;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AgeSubmitted(u8),
    DreamSubmitted(CreativeInput),
    AnalysisFinished(StageOutcome<AnalysisResult>),
    CareerSelected(usize),
    StoryReady(StageOutcome<StoryStep>),
    ChoiceMade(usize),
    MissionReady(StageOutcome<Mission>),
    MissionCompleted(Vec<RoundResult>),
    ConclusionReady(StageOutcome<Conclusion>),
    PlanRequested,
    PlanReady(StageOutcome<RealWorldPlan>),
    BackToGrowthMap,
    StartOver,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AgeSubmitted(_) => "age_submitted",
            Self::DreamSubmitted(_) => "dream_submitted",
            Self::AnalysisFinished(_) => "analysis_finished",
            Self::CareerSelected(_) => "career_selected",
            Self::StoryReady(_) => "story_ready",
            Self::ChoiceMade(_) => "choice_made",
            Self::MissionReady(_) => "mission_ready",
            Self::MissionCompleted(_) => "mission_completed",
            Self::ConclusionReady(_) => "conclusion_ready",
            Self::PlanRequested => "plan_requested",
            Self::PlanReady(_) => "plan_ready",
            Self::BackToGrowthMap => "back_to_growth_map",
            Self::StartOver => "start_over",
        }
    }
}

/// Generation call the caller must run after entering a loading stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRequest {
    AnalyzeDream {
        age: u8,
        input: CreativeInput,
    },
    StartSimulation {
        career: String,
        age: u8,
    },
    GenerateMission {
        career: String,
        choice: String,
        age: u8,
    },
    MissionFeedback {
        career: String,
        choice: String,
        results: Vec<RoundResult>,
        age: u8,
    },
    RealWorldPlan {
        career: String,
        traits: Vec<String>,
        age: u8,
    },
}

impl StageRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AnalyzeDream { .. } => "analyze_dream",
            Self::StartSimulation { .. } => "start_simulation",
            Self::GenerateMission { .. } => "generate_mission",
            Self::MissionFeedback { .. } => "mission_feedback",
            Self::RealWorldPlan { .. } => "real_world_plan",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: Session,
    pub request: Option<StageRequest>,
    pub accepted: bool,
}

impl Transition {
    fn rejected(session: &Session) -> Self {
        Self {
            session: session.clone(),
            request: None,
            accepted: false,
        }
    }

    fn to(session: Session) -> Self {
        Self {
            session,
            request: None,
            accepted: true,
        }
    }

    fn with_request(session: Session, request: StageRequest) -> Self {
        Self {
            session,
            request: Some(request),
            accepted: true,
        }
    }
}

const MISSING_AGE: &str = "Please start over and provide an age.";
const MISSING_CAREER: &str = "Please start over and pick a career to explore.";

/// Pure `(session, event) -> session` step.
///
/// Events that do not belong to the current stage are not accepted and leave the
/// session untouched, which keeps at most one generation call in flight.
pub fn transition(session: &Session, event: SessionEvent) -> Transition {
    let stage = session.stage;
    match (stage, event) {
        (_, SessionEvent::StartOver) => Transition::to(Session::default()),

        (Stage::AgeInput, SessionEvent::AgeSubmitted(age)) => {
            if !is_supported_age(age) {
                return reprompt(
                    session,
                    format!("Please enter an age between {MIN_AGE} and {MAX_AGE}."),
                );
            }
            Transition::to(Session {
                age: Some(age),
                stage: Stage::DreamInput,
                last_error: None,
                ..session.clone()
            })
        }

        (Stage::DreamInput, SessionEvent::DreamSubmitted(input)) => {
            let Some(age) = session.age else {
                return fail(session, MISSING_AGE);
            };
            if input.is_empty() {
                return reprompt(session, "Please describe or draw your dream first.");
            }
            Transition::with_request(
                Session {
                    stage: Stage::Analyzing,
                    last_error: None,
                    ..session.clone()
                },
                StageRequest::AnalyzeDream { age, input },
            )
        }

        (Stage::Analyzing, SessionEvent::AnalysisFinished(outcome)) => match outcome {
            Ok(analysis) => Transition::to(Session {
                analysis: Some(analysis),
                stage: Stage::Results,
                ..session.clone()
            }),
            Err(failure) => fail_stage(session, failure),
        },

        (Stage::Results, SessionEvent::CareerSelected(index)) => {
            let Some(age) = session.age else {
                return fail(session, MISSING_AGE);
            };
            let Some(career) = session
                .analysis
                .as_ref()
                .and_then(|analysis| analysis.career_paths.get(index))
                .cloned()
            else {
                return reprompt(session, "Please pick one of the listed careers.");
            };
            let name = career.name.clone();
            Transition::with_request(
                Session {
                    selected_career: Some(career),
                    stage: Stage::Simulating,
                    last_error: None,
                    ..session.clone()
                },
                StageRequest::StartSimulation { career: name, age },
            )
        }

        (Stage::Simulating, SessionEvent::StoryReady(outcome)) => match outcome {
            Ok(step) => Transition::to(Session {
                story_step: Some(step),
                stage: Stage::InStory,
                ..session.clone()
            }),
            Err(failure) => fail_stage(session, failure),
        },

        (Stage::InStory, SessionEvent::ChoiceMade(index)) => {
            let (Some(age), Some(career)) = (session.age, session.selected_career.as_ref())
            else {
                return fail(session, MISSING_CAREER);
            };
            let Some(choice) = session
                .story_step
                .as_ref()
                .and_then(|step| step.choices.get(index))
                .cloned()
            else {
                return reprompt(session, "Please pick one of the choices.");
            };
            let request = StageRequest::GenerateMission {
                career: career.name.clone(),
                choice: choice.text.clone(),
                age,
            };
            Transition::with_request(
                Session {
                    user_choice: Some(choice),
                    stage: Stage::MissionLoading,
                    last_error: None,
                    ..session.clone()
                },
                request,
            )
        }

        (Stage::MissionLoading, SessionEvent::MissionReady(outcome)) => match outcome {
            Ok(mission) => Transition::to(Session {
                mission: Some(mission),
                stage: Stage::InMission,
                ..session.clone()
            }),
            Err(failure) => fail_stage(session, failure),
        },

        (Stage::InMission, SessionEvent::MissionCompleted(results)) => {
            let (Some(age), Some(career), Some(choice)) = (
                session.age,
                session.selected_career.as_ref(),
                session.user_choice.as_ref(),
            ) else {
                return fail(session, MISSING_CAREER);
            };
            let request = StageRequest::MissionFeedback {
                career: career.name.clone(),
                choice: choice.text.clone(),
                results,
                age,
            };
            Transition::with_request(
                Session {
                    conclusion: None,
                    stage: Stage::Concluding,
                    last_error: None,
                    ..session.clone()
                },
                request,
            )
        }

        (Stage::Concluding, SessionEvent::ConclusionReady(outcome))
            if session.conclusion.is_none() =>
        {
            match outcome {
                Ok(conclusion) => {
                    let mut analysis = session.analysis.clone();
                    if let Some(analysis) = analysis.as_mut() {
                        analysis.merge_traits(&conclusion.unlocked_skills);
                    }
                    Transition::to(Session {
                        analysis,
                        conclusion: Some(conclusion),
                        ..session.clone()
                    })
                }
                Err(failure) => fail_stage(session, failure),
            }
        }

        (Stage::Concluding, SessionEvent::PlanRequested) if session.conclusion.is_some() => {
            let (Some(age), Some(career)) = (session.age, session.selected_career.as_ref())
            else {
                return fail(session, MISSING_CAREER);
            };
            let request = StageRequest::RealWorldPlan {
                career: career.name.clone(),
                traits: session.traits().to_vec(),
                age,
            };
            Transition::with_request(
                Session {
                    stage: Stage::PlannerLoading,
                    last_error: None,
                    ..session.clone()
                },
                request,
            )
        }

        (Stage::PlannerLoading, SessionEvent::PlanReady(outcome)) => match outcome {
            Ok(plan) => Transition::to(Session {
                plan: Some(plan),
                stage: Stage::PlanDisplay,
                ..session.clone()
            }),
            Err(failure) => fail_stage(session, failure),
        },

        (Stage::Concluding, SessionEvent::BackToGrowthMap) if session.conclusion.is_some() => {
            Transition::to(back_to_growth_map(session))
        }
        (Stage::PlanDisplay, SessionEvent::BackToGrowthMap) => {
            Transition::to(back_to_growth_map(session))
        }

        _ => Transition::rejected(session),
    }
}

fn back_to_growth_map(session: &Session) -> Session {
    Session {
        age: session.age,
        analysis: session.analysis.clone(),
        stage: Stage::Results,
        ..Session::default()
    }
}

fn reprompt(session: &Session, message: impl Into<String>) -> Transition {
    Transition::to(Session {
        last_error: Some(message.into()),
        ..session.clone()
    })
}

fn fail(session: &Session, message: impl Into<String>) -> Transition {
    Transition::to(Session {
        stage: Stage::Error,
        last_error: Some(message.into()),
        ..session.clone()
    })
}

fn fail_stage(session: &Session, failure: StageFailure) -> Transition {
    let message = if failure.message.trim().is_empty() {
        session.stage.failure_message().to_string()
    } else {
        failure.message
    };
    fail(session, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CareerPath, CoachingIcon, CoachingPoint, StoryChoice};

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            feedback: "You love the stars.".to_string(),
            traits: vec!["Curious".to_string(), "Brave".to_string()],
            career_paths: vec![
                CareerPath {
                    name: "Astronaut".to_string(),
                    description: "Flies to space.".to_string(),
                    image_url: String::new(),
                },
                CareerPath {
                    name: "Astronomer".to_string(),
                    description: "Studies the sky.".to_string(),
                    image_url: "data:image/png;base64,AAAA".to_string(),
                },
            ],
        }
    }

    fn story() -> StoryStep {
        StoryStep {
            text: "The rocket is ready.".to_string(),
            image_url: String::new(),
            choices: vec![
                StoryChoice {
                    text: "Check the fuel".to_string(),
                },
                StoryChoice {
                    text: "Talk to mission control".to_string(),
                },
            ],
        }
    }

    fn mission() -> Mission {
        Mission {
            title: "Launch Day".to_string(),
            rounds: Vec::new(),
        }
    }

    fn conclusion(unlocked: &[&str]) -> Conclusion {
        Conclusion {
            narrative_text: "The launch went great.".to_string(),
            image_url: String::new(),
            feedback_title: "Mission Accomplished!".to_string(),
            coaching_points: vec![CoachingPoint {
                text: "Sharp eyes!".to_string(),
                icon: CoachingIcon::Focus,
            }],
            unlocked_skills: unlocked.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn step(session: &Session, event: SessionEvent) -> Transition {
        transition(session, event)
    }

    fn in_mission() -> Session {
        let mut session = Session::default();
        for event in [
            SessionEvent::AgeSubmitted(8),
            SessionEvent::DreamSubmitted(CreativeInput::text("I want to be an astronaut")),
            SessionEvent::AnalysisFinished(Ok(analysis())),
            SessionEvent::CareerSelected(0),
            SessionEvent::StoryReady(Ok(story())),
            SessionEvent::ChoiceMade(0),
            SessionEvent::MissionReady(Ok(mission())),
        ] {
            let next = step(&session, event);
            assert!(next.accepted);
            session = next.session;
        }
        session
    }

    #[test]
    fn age_gate_rejects_out_of_range_and_reprompts() {
        let next = step(&Session::default(), SessionEvent::AgeSubmitted(5));
        assert!(next.accepted);
        assert_eq!(next.session.stage, Stage::AgeInput);
        assert_eq!(next.session.age, None);
        assert_eq!(
            next.session.last_error.as_deref(),
            Some("Please enter an age between 6 and 17.")
        );

        let next = step(&next.session, SessionEvent::AgeSubmitted(17));
        assert_eq!(next.session.stage, Stage::DreamInput);
        assert_eq!(next.session.age, Some(17));
        assert_eq!(next.session.last_error, None);
    }

    #[test]
    fn blank_dream_is_reprompted_without_a_request() {
        let session = step(&Session::default(), SessionEvent::AgeSubmitted(9)).session;
        let next = step(&session, SessionEvent::DreamSubmitted(CreativeInput::text("  ")));
        assert_eq!(next.session.stage, Stage::DreamInput);
        assert!(next.request.is_none());
        assert!(next.session.last_error.is_some());
    }

    #[test]
    fn dream_submission_requests_analysis() {
        let session = step(&Session::default(), SessionEvent::AgeSubmitted(8)).session;
        let input = CreativeInput::text("I want to be an astronaut");
        let next = step(&session, SessionEvent::DreamSubmitted(input.clone()));
        assert_eq!(next.session.stage, Stage::Analyzing);
        assert_eq!(
            next.request,
            Some(StageRequest::AnalyzeDream { age: 8, input })
        );
    }

    #[test]
    fn dream_without_age_is_a_contract_violation() {
        let session = Session {
            stage: Stage::DreamInput,
            ..Session::default()
        };
        let next = step(&session, SessionEvent::DreamSubmitted(CreativeInput::text("x")));
        assert_eq!(next.session.stage, Stage::Error);
        assert_eq!(next.session.last_error.as_deref(), Some(MISSING_AGE));
        assert!(next.request.is_none());
    }

    #[test]
    fn events_from_other_stages_are_not_accepted() {
        let session = step(&Session::default(), SessionEvent::AgeSubmitted(8)).session;
        let analyzing = step(
            &session,
            SessionEvent::DreamSubmitted(CreativeInput::text("space")),
        )
        .session;
        let duplicate = step(
            &analyzing,
            SessionEvent::DreamSubmitted(CreativeInput::text("space again")),
        );
        assert!(!duplicate.accepted);
        assert!(duplicate.request.is_none());
        assert_eq!(duplicate.session, analyzing);

        let early_plan = step(&analyzing, SessionEvent::PlanRequested);
        assert!(!early_plan.accepted);
    }

    #[test]
    fn failed_call_uses_message_or_stage_default() {
        let session = Session {
            age: Some(8),
            stage: Stage::Analyzing,
            ..Session::default()
        };
        let next = step(
            &session,
            SessionEvent::AnalysisFinished(Err(StageFailure::new(
                "Failed to get analysis from Becom.AI.",
            ))),
        );
        assert_eq!(next.session.stage, Stage::Error);
        assert_eq!(
            next.session.last_error.as_deref(),
            Some("Failed to get analysis from Becom.AI.")
        );

        let next = step(
            &session,
            SessionEvent::AnalysisFinished(Err(StageFailure::default())),
        );
        assert_eq!(next.session.last_error.as_deref(), Some("Analysis failed."));
    }

    #[test]
    fn career_selection_carries_name_and_age() {
        let session = Session {
            age: Some(8),
            analysis: Some(analysis()),
            stage: Stage::Results,
            ..Session::default()
        };
        let next = step(&session, SessionEvent::CareerSelected(0));
        assert_eq!(next.session.stage, Stage::Simulating);
        assert_eq!(
            next.request,
            Some(StageRequest::StartSimulation {
                career: "Astronaut".to_string(),
                age: 8,
            })
        );

        let out_of_range = step(&session, SessionEvent::CareerSelected(9));
        assert_eq!(out_of_range.session.stage, Stage::Results);
        assert!(out_of_range.request.is_none());
    }

    #[test]
    fn choice_without_career_goes_to_error() {
        let session = Session {
            age: Some(8),
            story_step: Some(story()),
            stage: Stage::InStory,
            ..Session::default()
        };
        let next = step(&session, SessionEvent::ChoiceMade(0));
        assert_eq!(next.session.stage, Stage::Error);
    }

    #[test]
    fn mission_completion_requests_feedback_then_merges_traits() {
        let session = in_mission();
        assert_eq!(session.stage, Stage::InMission);
        let results = vec![
            RoundResult::new("Focus", true),
            RoundResult::new("Logic", false),
        ];
        let next = step(&session, SessionEvent::MissionCompleted(results.clone()));
        assert_eq!(next.session.stage, Stage::Concluding);
        assert!(next.session.is_pending());
        assert_eq!(
            next.request,
            Some(StageRequest::MissionFeedback {
                career: "Astronaut".to_string(),
                choice: "Check the fuel".to_string(),
                results,
                age: 8,
            })
        );

        let early_plan = step(&next.session, SessionEvent::PlanRequested);
        assert!(!early_plan.accepted);

        let done = step(
            &next.session,
            SessionEvent::ConclusionReady(Ok(conclusion(&["Focus", "Brave"]))),
        );
        assert_eq!(done.session.stage, Stage::Concluding);
        assert!(!done.session.is_pending());
        assert_eq!(done.session.traits(), ["Curious", "Brave", "Focus"]);

        let again = step(
            &done.session,
            SessionEvent::ConclusionReady(Ok(conclusion(&["Logic"]))),
        );
        assert!(!again.accepted);
    }

    #[test]
    fn plan_request_uses_merged_traits() {
        let session = in_mission();
        let session = step(
            &session,
            SessionEvent::MissionCompleted(vec![RoundResult::new("Focus", true)]),
        )
        .session;
        let session = step(
            &session,
            SessionEvent::ConclusionReady(Ok(conclusion(&["Focus"]))),
        )
        .session;
        let next = step(&session, SessionEvent::PlanRequested);
        assert_eq!(next.session.stage, Stage::PlannerLoading);
        assert_eq!(
            next.request,
            Some(StageRequest::RealWorldPlan {
                career: "Astronaut".to_string(),
                traits: vec![
                    "Curious".to_string(),
                    "Brave".to_string(),
                    "Focus".to_string()
                ],
                age: 8,
            })
        );
    }

    #[test]
    fn back_to_growth_map_keeps_age_and_analysis() {
        let session = in_mission();
        let session = step(&session, SessionEvent::MissionCompleted(Vec::new())).session;
        let session = step(&session, SessionEvent::ConclusionReady(Ok(conclusion(&[])))).session;
        let next = step(&session, SessionEvent::BackToGrowthMap);
        assert_eq!(next.session.stage, Stage::Results);
        assert_eq!(next.session.age, Some(8));
        assert_eq!(next.session.analysis, session.analysis);
        assert!(next.session.selected_career.is_none());
        assert!(next.session.mission.is_none());
        assert!(next.session.conclusion.is_none());
        assert!(next.session.plan.is_none());
    }

    #[test]
    fn start_over_resets_everything_from_any_stage() {
        let session = in_mission();
        let next = step(&session, SessionEvent::StartOver);
        assert!(next.accepted);
        assert_eq!(next.session, Session::default());

        let error = Session {
            stage: Stage::Error,
            last_error: Some("boom".to_string()),
            ..Session::default()
        };
        assert_eq!(step(&error, SessionEvent::StartOver).session, Session::default());
    }

    #[test]
    fn late_result_after_reset_is_dropped() {
        let session = step(&Session::default(), SessionEvent::AgeSubmitted(8)).session;
        let analyzing = step(
            &session,
            SessionEvent::DreamSubmitted(CreativeInput::text("space")),
        )
        .session;
        let reset = step(&analyzing, SessionEvent::StartOver).session;
        let late = step(&reset, SessionEvent::AnalysisFinished(Ok(analysis())));
        assert!(!late.accepted);
        assert_eq!(late.session, Session::default());
    }
}
