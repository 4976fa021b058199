use anyhow::Result;
use becom_contracts::events::EventWriter;
use becom_contracts::session::{
    transition, Session, SessionEvent, StageFailure, StageOutcome, StageRequest,
};
use rand::Rng;
use serde_json::json;
use tracing::{debug, info};

use crate::service::{error_chain, ContentGenerationService, GenerationError};

/// Owns the live session and runs each generation call the state machine asks for.
///
/// Calls run to completion inside [`SessionDriver::dispatch`], so at most one is in
/// flight and its result is fed straight back as the matching completion event.
pub struct SessionDriver<R: Rng> {
    session: Session,
    service: ContentGenerationService,
    events: EventWriter,
    rng: R,
}

impl<R: Rng> SessionDriver<R> {
    pub fn new(service: ContentGenerationService, events: EventWriter, rng: R) -> Result<Self> {
        events.emit_value(
            "session_started",
            json!({
                "stage": Session::default().stage.name(),
                "text_backend": service.text_backend(),
            }),
        )?;
        Ok(Self {
            session: Session::default(),
            service,
            events,
            rng,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    /// Applies `event`, then any follow-up completion events. Returns whether `event`
    /// itself was accepted.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<bool> {
        let mut first_accepted = None;
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let event_name = event.name();
            let from = self.session.stage;
            let step = transition(&self.session, event);
            first_accepted.get_or_insert(step.accepted);
            if !step.accepted {
                debug!(event = event_name, stage = from.name(), "event ignored");
                self.events.emit_value(
                    "event_rejected",
                    json!({ "event": event_name, "stage": from.name() }),
                )?;
                continue;
            }

            let traits_before = self.session.traits().len();
            self.session = step.session;
            if self.session.stage != from {
                info!(from = from.name(), to = self.session.stage.name(), "stage changed");
                self.events.emit_value(
                    "stage_changed",
                    json!({
                        "event": event_name,
                        "from": from.name(),
                        "to": self.session.stage.name(),
                        "error": self.session.last_error,
                    }),
                )?;
            }
            let traits_after = self.session.traits().len();
            if traits_after > traits_before {
                self.events.emit_value(
                    "traits_merged",
                    json!({ "added": traits_after - traits_before, "traits": self.session.traits() }),
                )?;
            }

            if let Some(request) = step.request {
                self.events.emit_value(
                    "generation_requested",
                    json!({ "operation": request.name() }),
                )?;
                pending = Some(self.run(request)?);
            }
        }
        Ok(first_accepted.unwrap_or(false))
    }

    fn run(&mut self, request: StageRequest) -> Result<SessionEvent> {
        Ok(match request {
            StageRequest::AnalyzeDream { age, input } => {
                let result = self.service.analyze_dream(&input, age);
                SessionEvent::AnalysisFinished(self.outcome(result)?)
            }
            StageRequest::StartSimulation { career, age } => {
                let result = self.service.start_simulation(&career, age);
                SessionEvent::StoryReady(self.outcome(result)?)
            }
            StageRequest::GenerateMission {
                career,
                choice,
                age,
            } => {
                let result = self
                    .service
                    .generate_mission(&career, &choice, age, &mut self.rng);
                SessionEvent::MissionReady(self.outcome(result)?)
            }
            StageRequest::MissionFeedback {
                career,
                choice,
                results,
                age,
            } => {
                let result = self.service.mission_feedback(&career, &choice, &results, age);
                SessionEvent::ConclusionReady(self.outcome(result)?)
            }
            StageRequest::RealWorldPlan {
                career,
                traits,
                age,
            } => {
                let result = self.service.real_world_plan(&career, &traits, age);
                SessionEvent::PlanReady(self.outcome(result)?)
            }
        })
    }

    fn outcome<T>(&self, result: Result<T, GenerationError>) -> Result<StageOutcome<T>> {
        match result {
            Ok(value) => Ok(Ok(value)),
            Err(err) => {
                self.events.emit_value(
                    "generation_failed",
                    json!({
                        "operation": err.operation().map(|operation| operation.name()),
                        "message": err.user_message(),
                        "cause": error_chain(&err),
                    }),
                )?;
                Ok(Err(StageFailure::new(err.user_message())))
            }
        }
    }

    /// Final event for the log; the session itself stays usable.
    pub fn finish(&self) -> Result<()> {
        self.events.emit_value(
            "session_finished",
            json!({ "stage": self.session.stage.name() }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use becom_contracts::domain::{CreativeInput, RoundResult};
    use becom_contracts::events::read_event_types;
    use becom_contracts::session::Stage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    use super::*;
    use crate::service::testing::{harness, ScriptedText};

    fn replies() -> Vec<Value> {
        vec![
            json!({
                "feedback": "You love the stars!",
                "traits": ["Curious", "Brave"],
                "careerPaths": [
                    {"name": "Astronaut", "description": "Flies to space."},
                    {"name": "Astronomer", "description": "Studies the sky."}
                ]
            }),
            json!({
                "text": "Your rocket is on the launch pad.",
                "choices": [{"text": "Check the fuel"}, {"text": "Call mission control"}]
            }),
            json!({
                "title": "Countdown",
                "rounds": [
                    {
                        "instructions": "Find every star",
                        "skillToTest": "Focus",
                        "gameMode": "SELECT_ALL_CORRECT",
                        "objectTypes": [{"type": "star", "count": 2}, {"type": "moon", "count": 2}],
                        "correctObjectType": "star"
                    },
                    {
                        "instructions": "Which one does not belong?",
                        "skillToTest": "Logic",
                        "gameMode": "SELECT_THE_DIFFERENCE",
                        "objectTypes": [{"type": "moon", "count": 3}, {"type": "comet", "count": 1}],
                        "correctObjectType": "comet"
                    }
                ]
            }),
            json!({
                "text": "Liftoff!",
                "feedbackTitle": "Mission Accomplished!",
                "unlockedSkills": ["Focus", "Logic"],
                "coachingFeedback": [{"text": "Great focus!", "icon": "Focus"}]
            }),
            json!({
                "planTitle": "Your Astronaut Plan",
                "youtubeSuggestions": [],
                "onlineCourseSuggestions": [],
                "localActivitySuggestions": [],
                "growthMap": {
                    "centralCareer": {"title": "Astronaut", "imagePrompt": "a rocket"},
                    "traitNodes": [{"title": "Focus", "imagePrompt": "a target"}]
                },
                "parentEmail": {"subject": "Hello", "body": "Keep exploring."}
            }),
        ]
    }

    fn driver(
        dir: &std::path::Path,
        replies: Vec<Value>,
    ) -> Result<(SessionDriver<StdRng>, Arc<ScriptedText>)> {
        let h = harness(replies);
        let text = h.text.clone();
        let events = EventWriter::new(dir.join("events.jsonl"), "test-session");
        let driver = SessionDriver::new(h.service, events, StdRng::seed_from_u64(5))?;
        Ok((driver, text))
    }

    #[test]
    fn astronaut_dream_to_plan() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (mut driver, text) = driver(temp.path(), replies())?;

        assert!(driver.dispatch(SessionEvent::AgeSubmitted(8))?);
        assert!(driver.dispatch(SessionEvent::DreamSubmitted(CreativeInput::text(
            "I want to be an astronaut"
        )))?);
        assert_eq!(driver.session().stage, Stage::Results);
        assert_eq!(
            driver.session().analysis.as_ref().map(|a| a.career_paths.len()),
            Some(2)
        );

        driver.dispatch(SessionEvent::CareerSelected(0))?;
        assert_eq!(driver.session().stage, Stage::InStory);
        driver.dispatch(SessionEvent::ChoiceMade(0))?;
        assert_eq!(driver.session().stage, Stage::InMission);

        let mission = driver.session().mission.clone().expect("mission");
        assert_eq!(mission.rounds.len(), 2);
        let first_ok = mission.rounds[0].is_correct_selection(&mission.rounds[0].correct_object_ids);
        let results = vec![
            RoundResult::new(mission.rounds[0].skill_label.clone(), first_ok),
            RoundResult::new(mission.rounds[1].skill_label.clone(), false),
        ];
        driver.dispatch(SessionEvent::MissionCompleted(results))?;

        let session = driver.session();
        assert_eq!(session.stage, Stage::Concluding);
        let conclusion = session.conclusion.as_ref().expect("conclusion");
        assert_eq!(conclusion.unlocked_skills, vec!["Focus"]);
        assert_eq!(session.traits(), ["Curious", "Brave", "Focus"]);

        driver.dispatch(SessionEvent::PlanRequested)?;
        assert_eq!(driver.session().stage, Stage::PlanDisplay);
        let plan_request = text.requests().pop().expect("plan request");
        assert!(matches!(
            &plan_request.parts[0],
            crate::providers::ContentPart::Text(prompt) if prompt.contains("Curious, Brave, Focus")
        ));

        driver.dispatch(SessionEvent::StartOver)?;
        assert_eq!(driver.session(), &Session::default());
        driver.finish()?;

        let types = read_event_types(&temp.path().join("events.jsonl"))?;
        assert_eq!(types.first().map(String::as_str), Some("session_started"));
        assert_eq!(types.last().map(String::as_str), Some("session_finished"));
        assert_eq!(
            types.iter().filter(|kind| kind.as_str() == "generation_requested").count(),
            5
        );
        assert!(types.iter().any(|kind| kind == "traits_merged"));
        Ok(())
    }

    #[test]
    fn failed_analysis_lands_in_error_with_friendly_message() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (mut driver, _text) = driver(temp.path(), vec![json!({"feedback": "only this"})])?;
        driver.dispatch(SessionEvent::AgeSubmitted(10))?;
        driver.dispatch(SessionEvent::DreamSubmitted(CreativeInput::text("dragons")))?;

        assert_eq!(driver.session().stage, Stage::Error);
        assert_eq!(
            driver.session().last_error.as_deref(),
            Some("Failed to get analysis from Becom.AI.")
        );
        let types = read_event_types(&temp.path().join("events.jsonl"))?;
        assert!(types.iter().any(|kind| kind == "generation_failed"));

        driver.dispatch(SessionEvent::StartOver)?;
        assert_eq!(driver.session(), &Session::default());
        Ok(())
    }

    #[test]
    fn out_of_stage_events_are_logged_and_ignored() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let (mut driver, text) = driver(temp.path(), replies())?;
        assert!(!driver.dispatch(SessionEvent::PlanRequested)?);
        assert!(!driver.dispatch(SessionEvent::CareerSelected(0))?);
        assert_eq!(driver.session().stage, Stage::AgeInput);
        assert!(text.requests().is_empty());

        let types = read_event_types(&temp.path().join("events.jsonl"))?;
        assert_eq!(
            types.iter().filter(|kind| kind.as_str() == "event_rejected").count(),
            2
        );
        Ok(())
    }
}
