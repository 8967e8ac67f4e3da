use thiserror::Error;

/// Failures talking to the generative-AI provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API Key Missing")]
    Disabled,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by AI provider")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("No analysis available for {symbol}")]
    NoAnalysis { symbol: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Storage(value.to_string())
    }
}
