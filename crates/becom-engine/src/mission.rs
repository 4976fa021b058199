//! Mission design decoding and grid population.

use becom_contracts::domain::{GameMode, GridObject, Mission, Round};
use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDesign {
    pub title: String,
    pub rounds: Vec<RoundDesign>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDesign {
    pub instructions: String,
    pub skill_to_test: String,
    pub game_mode: GameMode,
    pub object_types: Vec<ObjectTypeCount>,
    pub correct_object_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectTypeCount {
    #[serde(rename = "type")]
    pub object_type: String,
    pub count: u32,
}

impl MissionDesign {
    /// Every object type across all rounds, first-seen order, no repeats.
    pub fn distinct_types(&self) -> Vec<String> {
        let mut seen: IndexMap<&str, ()> = IndexMap::new();
        for round in &self.rounds {
            for entry in &round.object_types {
                seen.entry(entry.object_type.as_str()).or_insert(());
            }
        }
        seen.into_keys().map(str::to_string).collect()
    }

    /// Builds shuffled rounds; `images` maps object type to data URL.
    pub fn populate<R: Rng + ?Sized>(
        self,
        images: &IndexMap<String, String>,
        rng: &mut R,
    ) -> Mission {
        let rounds = self
            .rounds
            .into_iter()
            .enumerate()
            .map(|(idx, design)| design.populate(idx + 1, images, rng))
            .collect();
        Mission {
            title: self.title,
            rounds,
        }
    }
}

impl RoundDesign {
    fn populate<R: Rng + ?Sized>(
        self,
        index: usize,
        images: &IndexMap<String, String>,
        rng: &mut R,
    ) -> Round {
        let mut grid_objects = build_grid(&self.object_types, images);
        shuffle(&mut grid_objects, rng);
        let correct_object_ids = grid_objects
            .iter()
            .filter(|object| object.object_type == self.correct_object_type)
            .map(|object| object.id.clone())
            .collect();
        Round {
            index,
            instructions: self.instructions,
            skill_label: self.skill_to_test,
            mode: self.game_mode,
            grid_objects,
            correct_object_ids,
        }
    }
}

/// `count` objects per entry with ids `type#ordinal`. Ordinals run per type across
/// the whole round, so a type listed twice keeps counting.
pub fn build_grid(
    object_types: &[ObjectTypeCount],
    images: &IndexMap<String, String>,
) -> Vec<GridObject> {
    let mut next_ordinal: IndexMap<&str, u32> = IndexMap::new();
    let mut grid = Vec::new();
    for entry in object_types {
        let image_url = images.get(&entry.object_type).cloned().unwrap_or_default();
        let ordinal = next_ordinal.entry(entry.object_type.as_str()).or_insert(0);
        for _ in 0..entry.count {
            grid.push(GridObject {
                id: format!("{}#{ordinal}", entry.object_type),
                object_type: entry.object_type.clone(),
                image_url: image_url.clone(),
            });
            *ordinal += 1;
        }
    }
    grid
}

/// Fisher-Yates.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
