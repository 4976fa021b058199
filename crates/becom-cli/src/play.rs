use becom_contracts::domain::{Mission, RoundResult};

/// Answers collected while a mission is on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionPlay {
    round: usize,
    results: Vec<RoundResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayProgress {
    NextRound { succeeded: bool },
    Finished(Vec<RoundResult>),
}

impl MissionPlay {
    pub fn current_round(&self) -> usize {
        self.round
    }

    /// Scores the current round; a round succeeds only on the exact correct set.
    pub fn answer(&mut self, mission: &Mission, selected: &[String]) -> Option<PlayProgress> {
        let round = mission.rounds.get(self.round)?;
        let succeeded = round.is_correct_selection(selected);
        self.results
            .push(RoundResult::new(round.skill_label.clone(), succeeded));
        self.round += 1;
        if self.round >= mission.rounds.len() {
            return Some(PlayProgress::Finished(std::mem::take(&mut self.results)));
        }
        Some(PlayProgress::NextRound { succeeded })
    }
}

#[cfg(test)]
mod tests {
    use becom_contracts::domain::{GameMode, Round};

    use super::*;

    fn round(index: usize, skill: &str, correct: &[&str]) -> Round {
        Round {
            index,
            instructions: String::new(),
            skill_label: skill.to_string(),
            mode: GameMode::SelectAllMatching,
            grid_objects: Vec::new(),
            correct_object_ids: correct.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn two_rounds_then_finished() {
        let mission = Mission {
            title: "Launch".to_string(),
            rounds: vec![
                round(1, "Focus", &["star#0", "star#1"]),
                round(2, "Logic", &["comet#0"]),
            ],
        };
        let mut play = MissionPlay::default();

        assert_eq!(
            play.answer(&mission, &ids(&["star#1", "star#0"])),
            Some(PlayProgress::NextRound { succeeded: true })
        );
        assert_eq!(play.current_round(), 1);
        assert_eq!(
            play.answer(&mission, &ids(&["moon#2"])),
            Some(PlayProgress::Finished(vec![
                RoundResult::new("Focus", true),
                RoundResult::new("Logic", false),
            ]))
        );
        assert_eq!(play.answer(&mission, &ids(&["comet#0"])), None);
    }

    #[test]
    fn partial_selection_fails_the_round() {
        let mission = Mission {
            title: "Launch".to_string(),
            rounds: vec![round(1, "Focus", &["star#0", "star#1"]), round(2, "Logic", &[])],
        };
        let mut play = MissionPlay::default();
        assert_eq!(
            play.answer(&mission, &ids(&["star#0"])),
            Some(PlayProgress::NextRound { succeeded: false })
        );
    }
}
