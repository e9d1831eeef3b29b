//! Error types for the rental API client.

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no session token; log in first")]
    MissingToken,
    #[error("session expired")]
    SessionExpired,
    #[error("server responded {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Remote { status: u16, message: Option<String> },
    #[error("server rejected the request: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
    #[error("Failed to parse response")]
    Decode {
        status: u16,
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the failure means the user must log in again
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::MissingToken | Self::SessionExpired)
    }

    /// Message to show the user: the server's own text when it sent one,
    /// `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::MissingToken => "You are not logged in. Please log in again.".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::Remote {
                message: Some(message),
                ..
            }
            | Self::Rejected {
                message: Some(message),
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
