use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    /// Non-success status, or an envelope carrying `success: false`.
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("response had no {0} payload")]
    MissingPayload(&'static str),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Rejected { status: 404, .. })
    }

    /// Message suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Rejected { message, .. } => message.clone(),
            ClientError::Timeout(_) => "The server took too long to respond.".into(),
            ClientError::Cancelled => "The request was cancelled.".into(),
            ClientError::Transport(_) => "Could not reach the server.".into(),
            other => other.to_string(),
        }
    }
}
