use std::path::PathBuf;

use thiserror::Error;

use crate::json::ParseError;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("missing API credentials ({0} not set)")]
    MissingCredentials(&'static str),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("reading page image {path}: {source}")]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unusable model output: {0}")]
    Parse(#[from] ParseError),
}

impl AiError {
    /// Whether another attempt may succeed: rate limiting, server-side failures and
    /// transport timeouts or connection failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::MissingCredentials(_) | Self::EmptyResponse | Self::Image { .. } | Self::Parse(_) => {
                false
            }
        }
    }

    /// Map a non-success HTTP response to an error.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
            Self::RateLimited(body)
        } else {
            Self::Server { status, body }
        }
    }
}
