use thiserror::Error;

/// A precondition of the command was not met. Nothing has been changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no text selected")]
    NoTextSelected,
    #[error("no API key configured")]
    NoApiKey,
    #[error("temperature must be a number, got {0:?}")]
    InvalidTemperature(String),
}

/// Failure of the single round trip to the completion endpoint.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Non-200 status. `body` is the raw response text.
    #[error("{body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
