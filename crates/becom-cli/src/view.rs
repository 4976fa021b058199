use std::fmt::Write as _;

use becom_contracts::age::{MAX_AGE, MIN_AGE};
use becom_contracts::domain::{PlanSuggestion, RealWorldPlan, Round};
use becom_contracts::session::{Session, Stage};

fn picture(url: &str) -> &'static str {
    if url.is_empty() {
        "[no picture]"
    } else {
        "[picture]"
    }
}

/// Text rendering of whatever the session currently shows.
pub fn render(session: &Session, round: Option<usize>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}", session.theme(), session.stage.name());
    if session.stage != Stage::Error {
        if let Some(err) = session.last_error.as_deref() {
            let _ = writeln!(out, "! {err}");
        }
    }
    if let Some(message) = session.loading_message() {
        let _ = writeln!(out, "{message}");
        return out;
    }

    match session.stage {
        Stage::AgeInput => {
            let _ = writeln!(out, "How old are you? ({MIN_AGE}-{MAX_AGE})  /age <years>");
        }
        Stage::DreamInput => {
            let _ = writeln!(
                out,
                "What do you dream of becoming? /dream <words>, and /draw <png> to add a drawing."
            );
        }
        Stage::Results => render_results(&mut out, session),
        Stage::InStory => {
            if let Some(step) = session.story_step.as_ref() {
                let _ = writeln!(out, "{} {}", picture(&step.image_url), step.text);
                for (idx, choice) in step.choices.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", idx + 1, choice.text);
                }
                let _ = writeln!(out, "/choose <number>");
            }
        }
        Stage::InMission => {
            if let Some(mission) = session.mission.as_ref() {
                let _ = writeln!(out, "Mission: {}", mission.title);
                if let Some(current) = round.and_then(|idx| mission.rounds.get(idx)) {
                    render_round(&mut out, current, mission.rounds.len());
                }
            }
        }
        Stage::Concluding => {
            if let Some(conclusion) = session.conclusion.as_ref() {
                let _ = writeln!(out, "{}", conclusion.feedback_title);
                let _ = writeln!(
                    out,
                    "{} {}",
                    picture(&conclusion.image_url),
                    conclusion.narrative_text
                );
                for point in &conclusion.coaching_points {
                    let _ = writeln!(out, "  {} {}", point.icon.glyph(), point.text);
                }
                if conclusion.unlocked_skills.is_empty() {
                    let _ = writeln!(out, "No new skills this time. Keep practicing!");
                } else {
                    let _ = writeln!(
                        out,
                        "Skills unlocked: {}",
                        conclusion.unlocked_skills.join(", ")
                    );
                }
                let _ = writeln!(out, "/plan for a real-world plan, /back to your growth map");
            }
        }
        Stage::PlanDisplay => {
            if let Some(plan) = session.plan.as_ref() {
                render_plan(&mut out, plan);
            }
        }
        Stage::Error => {
            let _ = writeln!(
                out,
                "Oops! {}",
                session.last_error.as_deref().unwrap_or("Something went wrong.")
            );
            let _ = writeln!(out, "/restart to try again");
        }
        Stage::Analyzing | Stage::Simulating | Stage::MissionLoading | Stage::PlannerLoading => {}
    }
    out
}

fn render_results(out: &mut String, session: &Session) {
    let Some(analysis) = session.analysis.as_ref() else {
        return;
    };
    let _ = writeln!(out, "{}", analysis.feedback);
    if !analysis.traits.is_empty() {
        let _ = writeln!(out, "Your traits: {}", analysis.traits.join(", "));
    }
    for (idx, career) in analysis.career_paths.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} {}: {}",
            idx + 1,
            picture(&career.image_url),
            career.name,
            career.description
        );
    }
    let _ = writeln!(out, "/pick <number> to explore a career");
}

fn render_round(out: &mut String, round: &Round, total: usize) {
    let _ = writeln!(
        out,
        "Round {}/{} ({}, tests {})",
        round.index,
        total,
        round.mode.label(),
        round.skill_label
    );
    let _ = writeln!(out, "{}", round.instructions);
    let ids: Vec<&str> = round.grid_objects.iter().map(|object| object.id.as_str()).collect();
    for row in ids.chunks(4) {
        let _ = writeln!(out, "  {}", row.join("   "));
    }
    let _ = writeln!(out, "/answer <id> [id ...]");
}

fn render_suggestions(out: &mut String, heading: &str, rows: &[PlanSuggestion]) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}");
    for row in rows {
        match row.platform.as_deref() {
            Some(platform) => {
                let _ = writeln!(out, "  - {} ({platform}): {}", row.title, row.description);
            }
            None => {
                let _ = writeln!(out, "  - {}: {}", row.title, row.description);
            }
        }
        let _ = writeln!(out, "    {}", row.url);
    }
}

fn render_plan(out: &mut String, plan: &RealWorldPlan) {
    let _ = writeln!(out, "{}", plan.title);
    let map = &plan.growth_map;
    let _ = writeln!(
        out,
        "Growth map: {} {}",
        picture(map.central_node.image_url.as_deref().unwrap_or_default()),
        map.central_node.title
    );
    for node in &map.trait_nodes {
        let _ = writeln!(
            out,
            "  +-- {} {}",
            picture(node.image_url.as_deref().unwrap_or_default()),
            node.title
        );
    }
    render_suggestions(out, "Videos", &plan.video_suggestions);
    render_suggestions(out, "Courses", &plan.course_suggestions);
    render_suggestions(out, "Activities", &plan.activity_suggestions);
    let _ = writeln!(out, "For your parents: {}", plan.parent_message.subject);
    let _ = writeln!(out, "{}", plan.parent_message.body);
    let _ = writeln!(out, "/export <path> to save the plan, /back to your growth map");
}

#[cfg(test)]
mod tests {
    use becom_contracts::domain::{
        AnalysisResult, CareerPath, GameMode, GridObject, Mission, Round,
    };

    use super::*;

    #[test]
    fn age_prompt_names_the_range() {
        let text = render(&Session::default(), None);
        assert!(text.starts_with("[theme-default] AgeInput"));
        assert!(text.contains("(6-17)"));
    }

    #[test]
    fn reprompt_error_is_shown_above_the_stage() {
        let session = Session {
            last_error: Some("Please enter an age between 6 and 17.".to_string()),
            ..Session::default()
        };
        assert!(render(&session, None).contains("! Please enter an age between 6 and 17."));
    }

    #[test]
    fn results_number_careers_and_flag_missing_pictures() {
        let session = Session {
            age: Some(8),
            stage: Stage::Results,
            analysis: Some(AnalysisResult {
                feedback: "You love the stars.".to_string(),
                traits: vec!["Curious".to_string()],
                career_paths: vec![CareerPath {
                    name: "Astronaut".to_string(),
                    description: "Flies to space.".to_string(),
                    image_url: String::new(),
                }],
            }),
            ..Session::default()
        };
        let text = render(&session, None);
        assert!(text.starts_with("[theme-younger] Results"));
        assert!(text.contains("  1. [no picture] Astronaut: Flies to space."));
    }

    #[test]
    fn mission_shows_the_current_round_grid() {
        let session = Session {
            stage: Stage::InMission,
            mission: Some(Mission {
                title: "Launch".to_string(),
                rounds: vec![Round {
                    index: 1,
                    instructions: "Find the stars".to_string(),
                    skill_label: "Focus".to_string(),
                    mode: GameMode::SelectAllMatching,
                    grid_objects: vec![GridObject {
                        id: "star#0".to_string(),
                        object_type: "star".to_string(),
                        image_url: String::new(),
                    }],
                    correct_object_ids: vec!["star#0".to_string()],
                }],
            }),
            ..Session::default()
        };
        let text = render(&session, Some(0));
        assert!(text.contains("Round 1/1"));
        assert!(text.contains("star#0"));
    }

    #[test]
    fn pending_stage_shows_loader_only() {
        let session = Session {
            stage: Stage::Analyzing,
            ..Session::default()
        };
        assert!(render(&session, None).contains("Analyzing your brilliant dream..."));
    }

    #[test]
    fn error_stage_offers_restart() {
        let session = Session {
            stage: Stage::Error,
            last_error: Some("Failed to get analysis from Becom.AI.".to_string()),
            ..Session::default()
        };
        let text = render(&session, None);
        assert!(text.contains("Oops! Failed to get analysis from Becom.AI."));
        assert!(text.contains("/restart"));
        assert!(!text.lines().any(|line| line.starts_with("! ")));
    }
}
