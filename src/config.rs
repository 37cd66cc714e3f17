//! Runtime configuration, resolved from environment variables

use std::path::PathBuf;

use crate::ai::gemini::GEMINI_API_BASE;

/// Default model names
pub mod defaults {
    pub const ANALYSIS_MODEL: &str = "gemini-2.5-pro";
    pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
    pub const SUGGESTION_MODEL: &str = "gemini-2.5-flash";
    pub const APP_DIR: &str = "digital-soul";
    pub const DB_FILE: &str = "digital_soul.db";
}

/// Environment variable names
pub mod vars {
    pub const API_KEY: &str = "GEMINI_API_KEY";
    pub const API_KEY_FALLBACK: &str = "API_KEY";
    pub const DB_PATH: &str = "DIGITAL_SOUL_DB";
    pub const ANALYSIS_MODEL: &str = "DIGITAL_SOUL_ANALYSIS_MODEL";
    pub const IMAGE_MODEL: &str = "DIGITAL_SOUL_IMAGE_MODEL";
    pub const SUGGESTION_MODEL: &str = "DIGITAL_SOUL_SUGGESTION_MODEL";
    pub const API_BASE: &str = "DIGITAL_SOUL_API_BASE";
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No API key set. Export {} (or {}).", vars::API_KEY, vars::API_KEY_FALLBACK)]
    MissingApiKey,

    #[error("Could not determine a data directory. Set {} to choose a database path.", vars::DB_PATH)]
    NoDataDir,
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub analysis_model: String,
    pub image_model: String,
    pub suggestion_model: String,
    pub db_path: PathBuf,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok(), default_db_path)
    }

    /// Resolve the configuration from a variable lookup.
    ///
    /// Blank values count as unset. `data_db_path` is only consulted when
    /// no explicit database path is given.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        data_db_path: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get(vars::API_KEY)
            .or_else(|| get(vars::API_KEY_FALLBACK))
            .ok_or(ConfigError::MissingApiKey)?;

        let db_path = match get(vars::DB_PATH) {
            Some(path) => PathBuf::from(path),
            None => data_db_path().ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self {
            api_key,
            api_base: get(vars::API_BASE).unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            analysis_model: get(vars::ANALYSIS_MODEL)
                .unwrap_or_else(|| defaults::ANALYSIS_MODEL.to_string()),
            image_model: get(vars::IMAGE_MODEL).unwrap_or_else(|| defaults::IMAGE_MODEL.to_string()),
            suggestion_model: get(vars::SUGGESTION_MODEL)
                .unwrap_or_else(|| defaults::SUGGESTION_MODEL.to_string()),
            db_path,
        })
    }

    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            api_key: "test-key".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            analysis_model: defaults::ANALYSIS_MODEL.to_string(),
            image_model: defaults::IMAGE_MODEL.to_string(),
            suggestion_model: defaults::SUGGESTION_MODEL.to_string(),
            db_path: PathBuf::from("digital_soul.db"),
        }
    }
}

/// Get the path where the database should be stored
///
/// - Linux: ~/.local/share/digital-soul/digital_soul.db
/// - macOS: ~/Library/Application Support/digital-soul/digital_soul.db
/// - Windows: %APPDATA%\digital-soul\digital_soul.db
fn default_db_path() -> Option<PathBuf> {
    let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
    path.push(defaults::APP_DIR);
    path.push(defaults::DB_FILE);
    Some(path)
}

// Keep the API key out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("analysis_model", &self.analysis_model)
            .field("image_model", &self.image_model)
            .field("suggestion_model", &self.suggestion_model)
            .field("db_path", &self.db_path)
            .finish()
    }
}
