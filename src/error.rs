use std::time::Duration;

use crate::classify::is_timeout_error;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The response head arrived but its body could not be read.
    #[error("reading {status} response body failed: {source}")]
    Body {
        /// Status of the response whose body failed.
        status: reqwest::StatusCode,
        source: reqwest::Error,
    },
    /// The send primitive gave up after its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Any other failure reported by a custom [`Transport`](crate::Transport).
    #[error("send error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Request could not be built (bad URL, body encoding).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Malformed configuration value.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Wraps an arbitrary error coming out of a custom send primitive.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }

    /// Status code received before the failure, when there was one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Body { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Returns true when this error, or anything in its source chain,
    /// carries a timeout indicator.
    pub fn is_timeout(&self) -> bool {
        is_timeout_error(self)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}
