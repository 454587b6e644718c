use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

/// Message shown when moderation flags the input.
pub const FLAGGED_MESSAGE: &str = "Input flagged as inappropriate.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    #[error("Response status {0}")]
    HttpStatus(u16),

    #[error("No readable paragraph text found on the page")]
    EmptyContent,

    #[error("Moderation check failed: {0}")]
    ModerationCheckFailed(String),

    #[error("{}", FLAGGED_MESSAGE)]
    ContentFlagged,

    #[error("OpenAI API error: {0}")]
    Completion(String),

    #[error("Please enter a URL or some text")]
    EmptyInput,

    #[error("Nothing to regenerate yet")]
    NothingToRegenerate,

    #[error("Unknown session")]
    SessionNotFound,

    #[error("A request for this session is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_) | AppError::EmptyInput => StatusCode::BAD_REQUEST,
            AppError::Fetch(_) | AppError::HttpStatus(_) => StatusCode::BAD_GATEWAY,
            AppError::EmptyContent | AppError::ContentFlagged => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ModerationCheckFailed(_) | AppError::Completion(_) => StatusCode::BAD_GATEWAY,
            AppError::NothingToRegenerate | AppError::Busy => StatusCode::CONFLICT,
            AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        response::error::<()>(self.status_code(), self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
