//! Remote generative-AI collaborators
//!
//! The controller only sees these three traits. `gemini.rs` holds the one
//! concrete implementation; tests substitute their own.

pub mod gemini;
pub mod prompts;

use async_trait::async_trait;

use crate::error::SoulError;
use crate::state::data::{AnalysisResult, ProfileData, ProfileField};

pub use gemini::GeminiClient;

/// Turns profile text into a soul description and a visual prompt
#[async_trait]
pub trait ProfileAnalyzer: Send + Sync {
    /// Fails with `SoulError::Analysis`
    async fn analyze(&self, profile: &ProfileData) -> Result<AnalysisResult, SoulError>;
}

/// Renders a visual prompt into a self-contained image payload (a `data:` URL)
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Fails with `SoulError::Generation`
    async fn generate(&self, visual_prompt: &str) -> Result<String, SoulError>;
}

/// Produces a short example value for a form field
#[async_trait]
pub trait FieldSuggester: Send + Sync {
    /// Fails with `SoulError::Suggestion`
    async fn suggest(&self, field: ProfileField) -> Result<String, SoulError>;
}
