use http::StatusCode;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The access token could not be decoded into a session identity.
    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// Token refresh failed and the session was cleared. Log in again.
    #[error("Session expired")]
    SessionExpired,

    #[error("{operation} failed ({status}): {detail}")]
    Api {
        operation: &'static str,
        status: StatusCode,
        detail: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl Error {
    /// HTTP status of a rejected API call, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller must drop any authenticated view and send the user to login.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(Box::new(e))
    }
}
