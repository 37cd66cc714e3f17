//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the gallery database, the remote collaborators and the UI layer.

use serde::Deserialize;

/// Represents a single generated image in the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Unique database ID, assigned on insert and never reused
    pub id: i64,
    /// Encoded image payload (a `data:` URL), opaque to the store
    pub url: String,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Free-text description of a social profile, as typed into the form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileData {
    pub username: String,
    pub bio: String,
    pub latest_post: String,
    pub mood_words: String,
    pub emojis: String,
}

impl ProfileData {
    /// Read one of the suggestible fields
    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Bio => &self.bio,
            ProfileField::LatestPost => &self.latest_post,
            ProfileField::MoodWords => &self.mood_words,
            ProfileField::Emojis => &self.emojis,
        }
    }

    /// Overwrite one of the suggestible fields
    pub fn set_field(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Bio => self.bio = value,
            ProfileField::LatestPost => self.latest_post = value,
            ProfileField::MoodWords => self.mood_words = value,
            ProfileField::Emojis => self.emojis = value,
        }
    }

    /// Bio and latest post must be filled in before a submission makes sense
    pub fn is_submittable(&self) -> bool {
        !self.bio.trim().is_empty() && !self.latest_post.trim().is_empty()
    }
}

/// The form fields the suggester can fill in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Bio,
    LatestPost,
    MoodWords,
    Emojis,
}

impl ProfileField {
    /// All suggestible fields, in form order
    pub const ALL: [ProfileField; 4] = [
        ProfileField::Bio,
        ProfileField::LatestPost,
        ProfileField::MoodWords,
        ProfileField::Emojis,
    ];

    /// Wire name used in logs and error messages (e.g., "latestPost")
    pub fn name(&self) -> &'static str {
        match self {
            ProfileField::Bio => "bio",
            ProfileField::LatestPost => "latestPost",
            ProfileField::MoodWords => "moodWords",
            ProfileField::Emojis => "emojis",
        }
    }

    /// Human-readable label for the form
    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Bio => "Bio",
            ProfileField::LatestPost => "Latest Post or Tweet",
            ProfileField::MoodWords => "Mood Words",
            ProfileField::Emojis => "Favorite Emojis",
        }
    }

    /// Example text shown while the field is empty
    pub fn placeholder(&self) -> &'static str {
        match self {
            ProfileField::Bio => "e.g., Coder, dreamer, coffee enthusiast.",
            ProfileField::LatestPost => "e.g., Just shipped a new feature, lo-fi time.",
            ProfileField::MoodWords => "e.g., chill, focused, creative",
            ProfileField::Emojis => "e.g., 💻☕✨🌙",
        }
    }
}

/// Structured reply of the profile analyzer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisResult {
    pub username: String,
    pub soul_description: String,
    pub visual_prompt: String,
}

impl AnalysisResult {
    /// Parse from the analyzer's JSON reply
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.trim())
    }
}
