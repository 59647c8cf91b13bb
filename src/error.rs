//! Error types shared by the transport and the selection model.

use thiserror::Error;

/// Failure to obtain a usable payload from the transport.
///
/// Everything except `Malformed` is a transport-level failure; `Malformed`
/// means a body arrived but did not have the expected shape. The controller
/// treats every variant as a single errored transition.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid credential {0}")]
    InvalidCredential(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Rejected feed key or sub-line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown feed key '{0}'")]
    UnknownFeed(String),

    #[error("line '{line}' is not part of feed {feed}")]
    UnknownSubLine { feed: String, line: String },
}
