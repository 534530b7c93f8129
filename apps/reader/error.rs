use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, ReaderError>;

/// Every failure the reader can surface. The binaries still collapse these into
/// one log line, but callers and tests can tell them apart.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed listing response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint for {source_id} is unreadable: {reason}")]
    Checkpoint { source_id: String, reason: String },

    #[error("'{0}' is not one of the offered choices")]
    InvalidChoice(String),

    #[error("Operator input closed")]
    InputClosed,

    #[error("Config error: {0}")]
    Config(String),
}

impl ReaderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReaderError::Io {
            path: path.into(),
            source,
        }
    }
}
