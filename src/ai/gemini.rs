//! Gemini REST client
//!
//! Implements all three collaborators on top of the `generateContent`
//! endpoint. Failures are logged with full detail and mapped to the short
//! messages the UI shows.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{prompts, FieldSuggester, ImageGenerator, ProfileAnalyzer};
use crate::config::Config;
use crate::error::SoulError;
use crate::state::data::{AnalysisResult, ProfileData, ProfileField};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key, so it never appears in request URLs
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Mime type assumed when an image part doesn't name one
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Errors from a single `generateContent` call
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not parse reply: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reply had no {0}")]
    MissingContent(&'static str),
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Serialize, Default)]
struct GeminiGenerationConfig {
    #[serde(rename = "stopSequences", skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    thought: bool,
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<GeminiBlob>,
}

#[derive(Debug, Deserialize)]
struct GeminiBlob {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &GeminiResponsePart> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter())
            .into_iter()
            .flatten()
    }

    /// Concatenated non-thought text of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline image of the first candidate, as a `data:` URL
    fn image_data_url(&self) -> Option<String> {
        self.parts()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|blob| !blob.data.is_empty())
            .map(|blob| {
                let mime = blob.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
                format!("data:{};base64,{}", mime, blob.data)
            })
    }
}

/// Trim a suggestion and drop one pair of surrounding double quotes
fn clean_suggestion(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('"').unwrap_or(text);
    let text = text.strip_suffix('"').unwrap_or(text);
    text.to_string()
}

/// Strip a Markdown code fence some models wrap JSON replies in
fn strip_json_fence(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|inner| inner.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

/// Models used for each collaborator
#[derive(Debug, Clone)]
struct Models {
    analysis: String,
    image: String,
    suggestion: String,
}

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    models: Models,
    client: HttpClient,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            models: Models {
                analysis: config.analysis_model.clone(),
                image: config.image_model.clone(),
                suggestion: config.suggestion_model.clone(),
            },
            client: HttpClient::new(),
        }
    }

    fn request(prompt: String, generation_config: GeminiGenerationConfig) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiRequestPart { text: prompt }],
            }],
            generation_config: Some(generation_config),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, ApiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        log::debug!("Calling Gemini model {}", model);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        if status != StatusCode::OK {
            return Err(ApiError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn request_analysis(&self, profile: &ProfileData) -> Result<AnalysisResult, ApiError> {
        let request = Self::request(
            prompts::analysis_prompt(profile),
            GeminiGenerationConfig {
                response_mime_type: Some("application/json"),
                response_schema: Some(prompts::analysis_schema()),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.analysis, &request).await?;
        let text = response.text().ok_or(ApiError::MissingContent("analysis text"))?;
        Ok(AnalysisResult::from_json(strip_json_fence(&text))?)
    }

    async fn request_image(&self, visual_prompt: &str) -> Result<String, ApiError> {
        let request = Self::request(
            prompts::image_prompt(visual_prompt),
            GeminiGenerationConfig {
                response_modalities: Some(vec!["IMAGE"]),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.image, &request).await?;
        response
            .image_data_url()
            .ok_or(ApiError::MissingContent("image data"))
    }

    async fn request_suggestion(&self, field: ProfileField) -> Result<String, ApiError> {
        let request = Self::request(
            prompts::suggestion_prompt(field).to_string(),
            GeminiGenerationConfig {
                stop_sequences: Some(vec!["\n".to_string()]),
                ..Default::default()
            },
        );

        let response = self.generate_content(&self.models.suggestion, &request).await?;
        response
            .text()
            .map(|text| clean_suggestion(&text))
            .ok_or(ApiError::MissingContent("suggestion text"))
    }
}

#[async_trait]
impl ProfileAnalyzer for GeminiClient {
    async fn analyze(&self, profile: &ProfileData) -> Result<AnalysisResult, SoulError> {
        self.request_analysis(profile).await.map_err(|err| {
            log::error!("Error analyzing profile: {}", err);
            SoulError::Analysis(
                "Failed to analyze profile. The AI may be feeling spectral today.".to_string(),
            )
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, visual_prompt: &str) -> Result<String, SoulError> {
        self.request_image(visual_prompt).await.map_err(|err| {
            log::error!("Error generating ghost image: {}", err);
            SoulError::Generation(
                "Failed to generate the ghost image. The ether seems to be unstable.".to_string(),
            )
        })
    }
}

#[async_trait]
impl FieldSuggester for GeminiClient {
    async fn suggest(&self, field: ProfileField) -> Result<String, SoulError> {
        self.request_suggestion(field).await.map_err(|err| {
            log::warn!("Error generating suggestion for {}: {}", field.name(), err);
            SoulError::Suggestion(format!(
                "The AI couldn't conjure a suggestion for {}.",
                field.name()
            ))
        })
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish()
    }
}
