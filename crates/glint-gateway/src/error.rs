//! Error types for glint-gateway

use thiserror::Error;

/// Result type alias using the gateway Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures a gateway round trip can surface to the overlay
#[derive(Error, Debug)]
pub enum Error {
    /// No signed-in identity where one is required
    #[error("User not authenticated")]
    Unauthenticated,

    /// No API key on file for the signed-in user
    #[error("No API key available. Please add your API key in settings.")]
    MissingCredential,

    /// The completion endpoint rejected or errored
    #[error("API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network failure reaching the completion endpoint
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The background side of the channel is gone
    #[error("Gateway unavailable")]
    ChannelClosed,

    /// Record store operation failed; logged and swallowed by callers
    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl Error {
    /// Create an upstream error from a status and message
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// The text the overlay appends as an assistant-role message when a
    /// round trip fails.
    pub fn as_assistant_text(&self) -> String {
        format!("Error: {}", self)
    }

    /// Whether the failure should prompt the user to sign in or add a key
    pub fn is_auth_related(&self) -> bool {
        matches!(self, Error::Unauthenticated | Error::MissingCredential)
    }
}
