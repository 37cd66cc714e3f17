//! Prompt templates sent to the Gemini models

use serde_json::{json, Value};

use crate::state::data::{ProfileData, ProfileField};

/// Appended to every visual prompt so the images share one look
const STICKER_STYLE: &str =
    "Render it as a flat 2D anime-style sticker with a bold outline and a faint paper texture.";

/// Prompt asking the text model for a soul description and a ghost concept
pub fn analysis_prompt(profile: &ProfileData) -> String {
    format!(
        "You read social media profiles and describe the person behind them as a small, \
friendly ghost in a white sheet.\n\
\n\
Profile:\n\
- Username: {username}\n\
- Bio: {bio}\n\
- Latest post: {post}\n\
- Mood words: {mood}\n\
- Emojis: {emojis}\n\
\n\
1. Write `soul_description`: at most two poetic sentences on the person's emotional \
energy and social vibe.\n\
2. Write `visual_prompt`: one vivid but minimal scene of the ghost, covering its \
accessories and colors, its expression and pose, a simple background, and props hinting \
at the latest post.\n\
3. Echo the username in `username`.\n\
\n\
Answer with JSON only.",
        username = profile.username,
        bio = profile.bio,
        post = profile.latest_post,
        mood = profile.mood_words,
        emojis = profile.emojis,
    )
}

/// Response schema forcing the analyzer to return all three fields
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "username": {
                "type": "STRING",
                "description": "The profile's username."
            },
            "soul_description": {
                "type": "STRING",
                "description": "Two poetic sentences about the person's online essence."
            },
            "visual_prompt": {
                "type": "STRING",
                "description": "A scene describing the ghost character for an image model."
            }
        },
        "required": ["username", "soul_description", "visual_prompt"]
    })
}

/// Visual prompt with the shared sticker style attached
pub fn image_prompt(visual_prompt: &str) -> String {
    format!("{}. {}", visual_prompt.trim().trim_end_matches('.'), STICKER_STYLE)
}

/// One-line prompt asking for an example value of `field`
pub fn suggestion_prompt(field: ProfileField) -> &'static str {
    match field {
        ProfileField::Bio => {
            "Write one short, slightly mysterious social media bio of 10 to 15 words. \
Reply with the bio only."
        }
        ProfileField::LatestPost => {
            "Write one short, reflective social media post of 20 to 25 words. \
Reply with the post only."
        }
        ProfileField::MoodWords => {
            "List 3 or 4 mood words separated by commas on a single line. \
Reply with the words only."
        }
        ProfileField::Emojis => {
            "Give a sequence of 4 or 5 emojis that tells a tiny story. \
Reply with the emojis only, on one line."
        }
    }
}
