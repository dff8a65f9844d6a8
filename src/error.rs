//! Error types for Porchlight

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'porchlight init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized for admin access")]
    Unauthorized,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Login code is expired or invalid")]
    ExpiredOrInvalidCode,

    #[error("{0}")]
    Other(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // User-facing text only; provider bodies and internal details stay
        // in the logs
        let (status, message) = match &self {
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            Error::Unauthorized => (StatusCode::FORBIDDEN, "Not authorized"),
            Error::InvalidCredentials => (StatusCode::BAD_REQUEST, "Invalid email or password"),
            Error::ExpiredOrInvalidCode => {
                (StatusCode::BAD_REQUEST, "Login code is expired or invalid")
            }
            Error::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        (status, message).into_response()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Transport failures must read as "no session", never as authenticated.
        Error::ProviderUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
