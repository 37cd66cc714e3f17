use crate::state::gallery::StoreError;

/// Failures surfaced to the user by the application controller.
///
/// Each variant carries the message shown in the result panel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoulError {
    #[error("{0}")]
    Analysis(String),

    #[error("{0}")]
    Generation(String),

    #[error("{0}")]
    Suggestion(String),

    #[error("Could not save the image to the gallery: {0}")]
    Storage(String),
}

impl From<StoreError> for SoulError {
    fn from(err: StoreError) -> Self {
        SoulError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SoulError {
    fn from(err: tokio::task::JoinError) -> Self {
        SoulError::Storage(format!("storage task failed: {}", err))
    }
}
