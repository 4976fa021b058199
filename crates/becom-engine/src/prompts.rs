//! Directives, user prompts and illustration prompts for each generation call.

use becom_contracts::age::AgeBand;
use becom_contracts::domain::{CreativeInput, RoundResult};
use becom_contracts::schema::ContractKind;

use crate::providers::{ContentPart, StructuredRequest};

pub const ANALYSIS_TEMPERATURE: f32 = 0.7;
pub const STORY_TEMPERATURE: f32 = 0.8;
pub const MISSION_TEMPERATURE: f32 = 0.8;
pub const FEEDBACK_TEMPERATURE: f32 = 0.7;
pub const PLAN_TEMPERATURE: f32 = 0.7;

const DRAWING_MIME: &str = "image/png";

fn tone(age: u8) -> String {
    AgeBand::for_age(age).tone_directive()
}

fn request(
    kind: ContractKind,
    system_directive: String,
    parts: Vec<ContentPart>,
    temperature: f32,
) -> StructuredRequest {
    StructuredRequest {
        system_directive,
        parts,
        contract: kind.contract(),
        temperature,
    }
}

/// Drawing part (when present) precedes the text part.
pub fn analysis_request(input: &CreativeInput, age: u8) -> StructuredRequest {
    let system = format!(
        "You are 'Becom.AI', an AI guide. {} Your goal is to help users discover interests \
         based on their creative expressions. Your tone is positive, curious, and simple. \
         Analyze the user's creative input (text, drawing, or both) to identify themes and \
         suggest future paths.",
        tone(age)
    );
    let text = input.text.trim();
    let mut parts = Vec::new();
    if let Some(drawing) = input.drawing.as_ref().filter(|bytes| !bytes.is_empty()) {
        parts.push(ContentPart::InlineImage {
            mime_type: DRAWING_MIME.to_string(),
            data: drawing.clone(),
        });
    }
    let prompt = match (input.has_text(), input.has_drawing()) {
        (true, true) => format!(
            "My dream is: \"{text}\". Based on my drawing and this text, what do you see?"
        ),
        (true, false) => format!("My dream is: \"{text}\". Based on this, what do you see?"),
        _ => "This is a drawing of my dream. Based on this image, what do you see?".to_string(),
    };
    parts.push(ContentPart::Text(prompt));
    request(ContractKind::Analysis, system, parts, ANALYSIS_TEMPERATURE)
}

pub fn story_request(career: &str, age: u8) -> StructuredRequest {
    let system = format!(
        "You are a creative storyteller. {} Create the first part of a 'day-in-the-life' story \
         for a {career}. The story must be one sentence, visual, exciting, and present a clear \
         choice between two different but simple actions.",
        tone(age)
    );
    let prompt = format!("Start a one-sentence story about my day as a {career}.");
    request(
        ContractKind::Story,
        system,
        vec![ContentPart::Text(prompt)],
        STORY_TEMPERATURE,
    )
}

pub fn mission_request(career: &str, choice: &str, age: u8) -> StructuredRequest {
    let system = format!(
        "You are a game designer. {} The user is playing as a {career} and just chose to \
         '{choice}'. Create a job-specific, visual, multi-round mini-game with exactly 2 rounds. \
         The difficulty and theme should suit the user's age. For each round pick a game mode \
         that tests a relevant skill:\n\
         - 'SELECT_ALL_CORRECT': an 'I-Spy' style game where every matching object is found.\n\
         - 'SELECT_THE_DIFFERENCE': an 'odd-one-out' game.\n\
         Objectives, objects and game modes must fit the career and the user's choice. Every \
         object type is a single, simple, drawable object name.",
        tone(age)
    );
    let prompt = format!("Generate a 2-round mission based on my choice to '{choice}' as a {career}.");
    request(
        ContractKind::Mission,
        system,
        vec![ContentPart::Text(prompt)],
        MISSION_TEMPERATURE,
    )
}

/// One sentence per round, in round order.
pub fn results_summary(results: &[RoundResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            format!(
                "In round {}, they were tested on '{}' and they {}.",
                idx + 1,
                result.skill_label,
                if result.success { "succeeded" } else { "failed" }
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn feedback_request(
    career: &str,
    choice: &str,
    results: &[RoundResult],
    age: u8,
) -> StructuredRequest {
    let system = format!(
        "You are an AI career coach. {} The user played as a {career}, made a choice, and \
         completed a 2-round mission. Provide a final, encouraging debrief. Your feedback must \
         be accurate, honest, and use age-appropriate language.",
        tone(age)
    );
    let prompt = format!(
        "The user is playing as a {career}.\n\
         Their initial choice was to: '{choice}'.\n\
         Their mission performance was: {}\n\n\
         Based on all of this, give me a final debrief.\n\
         1. 'unlockedSkills' MUST ONLY contain skills from rounds the user succeeded in. If they \
         failed every round it MUST be empty. Do not invent skills or include failed ones.\n\
         2. 'coachingFeedback' is encouraging but realistic. If a round was failed, acknowledge \
         the challenge and praise the effort instead of pretending it succeeded.\n\
         3. Give every feedback point an icon keyword from: {}.",
        results_summary(results),
        becom_contracts::domain::CoachingIcon::KEYS.join(", ")
    );
    request(
        ContractKind::Conclusion,
        system,
        vec![ContentPart::Text(prompt)],
        FEEDBACK_TEMPERATURE,
    )
}

pub fn plan_request(career: &str, traits: &[String], age: u8) -> StructuredRequest {
    let system = format!(
        "You are 'Becom.AI', an AI guide helping users turn digital discoveries into real-world \
         actions. {} You are creating a concrete plan for a user interested in becoming a \
         {career}. All suggestions must be strictly appropriate for the user's age.",
        tone(age)
    );
    let prompt = format!(
        "The user is interested in being a {career}. Their observed traits are: {}.\n\
         Please create a real-world action plan for them.\n\
         - For YouTube and online courses, provide working search URLs \
         ('https://www.youtube.com/results?search_query=...' or \
         'https://www.khanacademy.org/search?page_search_query=...'). Content MUST suit a \
         {age}-year-old.\n\
         - For local activities, generate Google Calendar event links \
         ('https://calendar.google.com/calendar/render?action=TEMPLATE&text=...&details=...'). \
         Do not assume a location.\n\
         - The growth map is a mind map: the central node is the career and the surrounding \
         nodes are the user's traits. Give each node a simple 'imagePrompt' for a cute icon.\n\
         - The parent email is supportive, written in Markdown, explains how to support a \
         {age}-year-old's interests, and summarizes the key suggestions.",
        traits.join(", ")
    );
    request(
        ContractKind::Plan,
        system,
        vec![ContentPart::Text(prompt)],
        PLAN_TEMPERATURE,
    )
}

pub fn career_illustration(career: &str, age: u8) -> String {
    let suffix = if age <= 11 {
        ", simple, clear, for a child"
    } else {
        ""
    };
    format!("A vibrant and friendly cartoon illustration of a {career}{suffix}. No text in the image.")
}

pub fn story_illustration(career: &str, age: u8, scene: &str) -> String {
    format!(
        "A vibrant, kid-friendly cartoon illustration for a story about a {career}, suitable for \
         a {age}-year-old. The scene depicts: {scene}. No text in the image."
    )
}

pub fn object_illustration(object_type: &str) -> String {
    format!(
        "A single, cute cartoon {object_type} on a plain white background, sticker style, no \
         shadows. Simple, vibrant, and clear for a child's game."
    )
}

pub fn conclusion_illustration(career: &str, age: u8, outcome: &str) -> String {
    format!(
        "A vibrant, cartoon illustration for a story about a {career}, suitable for a \
         {age}-year-old. The scene depicts the successful outcome: {outcome}. No text in the \
         image."
    )
}

pub fn growth_icon(image_prompt: &str) -> String {
    format!(
        "{image_prompt}, cute cartoon icon, simple, sticker style, on a plain white background, \
         no shadows"
    )
}
