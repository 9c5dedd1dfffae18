use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExploreError {
    #[error("no results found")]
    NoResultsFound,
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("result no longer matches the current selection")]
    StaleResult,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ExploreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::ProviderUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for ExploreError {
    fn from(err: reqwest::Error) -> Self {
        Self::unavailable(err)
    }
}

impl From<serde_json::Error> for ExploreError {
    fn from(err: serde_json::Error) -> Self {
        Self::ProviderUnavailable(format!("malformed provider payload: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ExploreError>;
