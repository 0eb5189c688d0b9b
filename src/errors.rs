use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Failed to access chat platform API: {0}")]
    ApiError(String),

    #[error("Failed to access generation service: {0}")]
    GenerationError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("No prompt text was provided")]
    EmptyInput,
}

impl BotError {
    /// True for failures of a call to the chat platform, the generation
    /// service, or the backing store. These abort the current destination or
    /// request and are never retried.
    #[must_use]
    pub fn is_external_call_failure(&self) -> bool {
        matches!(
            self,
            BotError::ApiError(_)
                | BotError::GenerationError(_)
                | BotError::HttpError(_)
                | BotError::AwsError(_)
        )
    }
}

impl From<SlackClientError> for BotError {
    fn from(error: SlackClientError) -> Self {
        BotError::ApiError(error.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::HttpError(error.to_string())
    }
}
