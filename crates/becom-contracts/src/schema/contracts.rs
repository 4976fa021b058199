use crate::domain::GameMode;

use super::{Field, FieldShape, ObjectShape, SchemaContract};

/// Upper bound on `count` for a single mission object type.
pub const MAX_OBJECTS_PER_TYPE: i64 = 12;
pub const MAX_OBJECT_TYPES_PER_ROUND: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Analysis,
    Story,
    Mission,
    Conclusion,
    Plan,
}

impl ContractKind {
    pub const ALL: [ContractKind; 5] = [
        Self::Analysis,
        Self::Story,
        Self::Mission,
        Self::Conclusion,
        Self::Plan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Analysis => "dream_analysis",
            Self::Story => "story_step",
            Self::Mission => "mission_design",
            Self::Conclusion => "mission_feedback",
            Self::Plan => "real_world_plan",
        }
    }

    pub fn contract(self) -> SchemaContract {
        match self {
            Self::Analysis => analysis_contract(),
            Self::Story => story_contract(),
            Self::Mission => mission_contract(),
            Self::Conclusion => conclusion_contract(),
            Self::Plan => plan_contract(),
        }
    }
}

fn object(fields: Vec<Field>) -> FieldShape {
    FieldShape::Object(ObjectShape::new(fields))
}

pub fn analysis_contract() -> SchemaContract {
    let career = object(vec![
        Field::required("name", FieldShape::String).describe("The name of the career."),
        Field::required("description", FieldShape::String)
            .describe("A one-sentence description of the career for the user's age."),
    ]);
    SchemaContract {
        kind: ContractKind::Analysis,
        root: ObjectShape::new(vec![
            Field::required("feedback", FieldShape::String).describe(
                "A short, encouraging paragraph (2-3 sentences) addressing the user as 'you'.",
            ),
            Field::required("traits", FieldShape::array_of(FieldShape::String))
                .describe("3-5 single-word personality traits or skills observed."),
            Field::required("careerPaths", FieldShape::array_between(career, 1, None))
                .describe("2-3 potential career paths."),
        ]),
    }
}

pub fn story_contract() -> SchemaContract {
    let choice = object(vec![
        Field::required("text", FieldShape::String).describe("The text for the choice.")
    ]);
    SchemaContract {
        kind: ContractKind::Story,
        root: ObjectShape::new(vec![
            Field::required("text", FieldShape::String)
                .describe("A single engaging sentence setting a scene for a choice."),
            Field::required("choices", FieldShape::array_between(choice, 1, None))
                .describe("Exactly two short action phrases."),
        ]),
    }
}

pub fn mission_contract() -> SchemaContract {
    let object_type = object(vec![
        Field::required("type", FieldShape::String),
        Field::required(
            "count",
            FieldShape::integer_between(1, MAX_OBJECTS_PER_TYPE),
        ),
    ]);
    let round = object(vec![
        Field::required("instructions", FieldShape::String)
            .describe("Simple, clear instructions for this round's objective."),
        Field::required("skillToTest", FieldShape::String)
            .describe("The primary skill tested in this round."),
        Field::required("gameMode", FieldShape::Enum(GameMode::WIRE_NAMES)).describe(
            "'SELECT_ALL_CORRECT' to find all matching items, 'SELECT_THE_DIFFERENCE' to find the odd one out.",
        ),
        Field::required(
            "objectTypes",
            FieldShape::array_between(object_type, 1, Some(MAX_OBJECT_TYPES_PER_ROUND)),
        )
            .describe("Object types for the grid; each type is a single simple drawable object."),
        Field::required("correctObjectType", FieldShape::String)
            .describe("The type of the correct object; must match one of objectTypes."),
    ]);
    SchemaContract {
        kind: ContractKind::Mission,
        root: ObjectShape::new(vec![
            Field::required("title", FieldShape::String)
                .describe("A short, exciting title for the mission."),
            Field::required("rounds", FieldShape::exactly(round, 2))
                .describe("Exactly 2 game rounds."),
        ]),
    }
}

pub fn conclusion_contract() -> SchemaContract {
    let coaching = object(vec![
        Field::required("text", FieldShape::String),
        Field::required("icon", FieldShape::String).describe(
            "One icon keyword: Adventure, ProblemSolving, Focus, Creativity, Teamwork, Curiosity.",
        ),
    ]);
    SchemaContract {
        kind: ContractKind::Conclusion,
        root: ObjectShape::new(vec![
            Field::required("text", FieldShape::String)
                .describe("A single positive concluding sentence describing the outcome."),
            Field::required("feedbackTitle", FieldShape::String),
            Field::required("unlockedSkills", FieldShape::array_of(FieldShape::String)).describe(
                "Only skills from rounds where the user succeeded; empty if none succeeded.",
            ),
            Field::required("coachingFeedback", FieldShape::array_of(coaching))
                .describe("2-3 short, reflective coaching points."),
        ]),
    }
}

pub fn plan_contract() -> SchemaContract {
    let suggestion = || {
        object(vec![
            Field::required("title", FieldShape::String),
            Field::required("description", FieldShape::String),
            Field::required("url", FieldShape::String),
        ])
    };
    let course = object(vec![
        Field::required("title", FieldShape::String),
        Field::required("platform", FieldShape::String),
        Field::required("description", FieldShape::String),
        Field::required("url", FieldShape::String)
            .describe("A full Khan Academy search URL."),
    ]);
    let node = || {
        object(vec![
            Field::required("title", FieldShape::String),
            Field::required("imagePrompt", FieldShape::String)
                .describe("A simple prompt for a cute cartoon icon."),
        ])
    };
    SchemaContract {
        kind: ContractKind::Plan,
        root: ObjectShape::new(vec![
            Field::required("planTitle", FieldShape::String),
            Field::required("youtubeSuggestions", FieldShape::array_of(suggestion()))
                .describe("2 kid-friendly video ideas with YouTube search URLs."),
            Field::required("onlineCourseSuggestions", FieldShape::array_of(course))
                .describe("1-2 online course ideas."),
            Field::required("localActivitySuggestions", FieldShape::array_of(suggestion()))
                .describe("2 generic local activities with calendar links."),
            Field::required(
                "growthMap",
                object(vec![
                    Field::required("centralCareer", node()),
                    Field::required("traitNodes", FieldShape::array_of(node())),
                ]),
            ),
            Field::required(
                "parentEmail",
                object(vec![
                    Field::required("subject", FieldShape::String),
                    Field::required("body", FieldShape::String)
                        .describe("Markdown summary of progress and how to support the child."),
                ]),
            ),
        ]),
    }
}
