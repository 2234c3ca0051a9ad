//! Error types for the songify library.
//!
//! Every fallible library operation returns [`Result`]. The enum is `Clone`
//! because a refresh result is shared between every caller awaiting the same
//! in-flight refresh.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed: {status}")]
    RefreshFailed { status: StatusCode },

    #[error("No access token found")]
    Unauthenticated,

    #[error("HTTP error! status: {status}")]
    HttpError { status: StatusCode },

    #[error("Code is required")]
    MissingCode,

    #[error("Refresh token is required")]
    MissingRefreshToken,

    #[error("Failed to fetch token from Spotify: {status}")]
    ProviderExchangeFailed { status: StatusCode, body: String },

    #[error("Stored profile is malformed: {0}")]
    MalformedStoredProfile(String),

    #[error("Authorization state does not match the pending login")]
    StateMismatch,

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status reported by the local server when a handler fails with
    /// this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCode | Self::MissingRefreshToken => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::NoRefreshToken => StatusCode::UNAUTHORIZED,
            Self::RefreshFailed { status }
            | Self::HttpError { status }
            | Self::ProviderExchangeFailed { status, .. } => *status,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Network(_) | Self::Decode(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this failure wiped the stored credentials.
    pub fn clears_credentials(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpError { status }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
