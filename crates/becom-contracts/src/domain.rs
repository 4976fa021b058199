use serde::{Deserialize, Serialize};

/// Normalized output of the dream capture step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreativeInput {
    pub text: String,
    pub drawing: Option<Vec<u8>>,
}

impl CreativeInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            drawing: None,
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_drawing(&self) -> bool {
        self.drawing.as_ref().is_some_and(|bytes| !bytes.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_text() && !self.has_drawing()
    }
}

/// Source of dream input (keyboard, drawing canvas, transcript).
pub trait CreativeInputCapture {
    fn capture(&mut self) -> anyhow::Result<CreativeInput>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    pub name: String,
    pub description: String,
    /// Empty until an illustration was generated; stays empty when generation failed.
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub feedback: String,
    pub traits: Vec<String>,
    pub career_paths: Vec<CareerPath>,
}

impl AnalysisResult {
    /// Union `skills` into the trait list, keeping first-seen order.
    pub fn merge_traits(&mut self, skills: &[String]) -> usize {
        let mut added = 0;
        for skill in skills {
            if !self.traits.iter().any(|existing| existing == skill) {
                self.traits.push(skill.clone());
                added += 1;
            }
        }
        added
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChoice {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStep {
    pub text: String,
    #[serde(default)]
    pub image_url: String,
    pub choices: Vec<StoryChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "SELECT_ALL_CORRECT")]
    SelectAllMatching,
    #[serde(rename = "SELECT_THE_DIFFERENCE")]
    SelectOddOneOut,
}

impl GameMode {
    pub const WIRE_NAMES: &'static [&'static str] = &["SELECT_ALL_CORRECT", "SELECT_THE_DIFFERENCE"];

    pub fn label(self) -> &'static str {
        match self {
            Self::SelectAllMatching => "find all matching",
            Self::SelectOddOneOut => "spot the odd one out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridObject {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub index: usize,
    pub instructions: String,
    pub skill_label: String,
    pub mode: GameMode,
    pub grid_objects: Vec<GridObject>,
    pub correct_object_ids: Vec<String>,
}

impl Round {
    /// A selection succeeds when it names exactly the correct objects.
    pub fn is_correct_selection(&self, selected: &[String]) -> bool {
        let mut picked: Vec<&str> = selected.iter().map(String::as_str).collect();
        picked.sort_unstable();
        picked.dedup();
        let mut expected: Vec<&str> = self.correct_object_ids.iter().map(String::as_str).collect();
        expected.sort_unstable();
        picked == expected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub title: String,
    pub rounds: Vec<Round>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub skill_label: String,
    pub success: bool,
}

impl RoundResult {
    pub fn new(skill_label: impl Into<String>, success: bool) -> Self {
        Self {
            skill_label: skill_label.into(),
            success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoachingIcon {
    Adventure,
    ProblemSolving,
    Focus,
    Creativity,
    Teamwork,
    Curiosity,
    #[default]
    Default,
}

impl CoachingIcon {
    pub const KEYS: &'static [&'static str] = &[
        "Adventure",
        "ProblemSolving",
        "Focus",
        "Creativity",
        "Teamwork",
        "Curiosity",
    ];

    /// Unknown keys map to `Default`; whitespace inside the key is ignored.
    pub fn from_key(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
        match compact.as_str() {
            "Adventure" => Self::Adventure,
            "ProblemSolving" => Self::ProblemSolving,
            "Focus" => Self::Focus,
            "Creativity" => Self::Creativity,
            "Teamwork" => Self::Teamwork,
            "Curiosity" => Self::Curiosity,
            _ => Self::Default,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Adventure => "Adventure",
            Self::ProblemSolving => "ProblemSolving",
            Self::Focus => "Focus",
            Self::Creativity => "Creativity",
            Self::Teamwork => "Teamwork",
            Self::Curiosity => "Curiosity",
            Self::Default => "Default",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Adventure => "[map]",
            Self::ProblemSolving => "[brain]",
            Self::Focus => "[eye]",
            Self::Creativity => "[idea]",
            Self::Teamwork => "[team]",
            Self::Curiosity => "[?]",
            Self::Default => "[*]",
        }
    }
}

impl From<String> for CoachingIcon {
    fn from(value: String) -> Self {
        Self::from_key(&value)
    }
}

impl From<CoachingIcon> for String {
    fn from(value: CoachingIcon) -> Self {
        value.key().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingPoint {
    pub text: String,
    pub icon: CoachingIcon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conclusion {
    #[serde(rename = "text")]
    pub narrative_text: String,
    #[serde(default)]
    pub image_url: String,
    pub feedback_title: String,
    #[serde(rename = "coachingFeedback")]
    pub coaching_points: Vec<CoachingPoint>,
    pub unlocked_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSuggestion {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMapNode {
    pub title: String,
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMap {
    #[serde(rename = "centralCareer")]
    pub central_node: GrowthMapNode,
    pub trait_nodes: Vec<GrowthMapNode>,
}

impl GrowthMap {
    /// Central node first, then trait nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &GrowthMapNode> {
        std::iter::once(&self.central_node).chain(self.trait_nodes.iter())
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GrowthMapNode> {
        std::iter::once(&mut self.central_node).chain(self.trait_nodes.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealWorldPlan {
    #[serde(rename = "planTitle")]
    pub title: String,
    #[serde(rename = "youtubeSuggestions")]
    pub video_suggestions: Vec<PlanSuggestion>,
    #[serde(rename = "onlineCourseSuggestions")]
    pub course_suggestions: Vec<PlanSuggestion>,
    #[serde(rename = "localActivitySuggestions")]
    pub activity_suggestions: Vec<PlanSuggestion>,
    pub growth_map: GrowthMap,
    #[serde(rename = "parentEmail")]
    pub parent_message: ParentMessage,
}
