use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, LabellerError>;

#[derive(Debug, Error)]
pub enum LabellerError {
    #[error("Io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Label index {index} is out of range, {available} labels are configured")]
    UnknownLabel { index: usize, available: usize },

    #[error("Chunk size must be at least one token")]
    ZeroChunkSize,
}

impl LabellerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LabellerError::Io {
            path: path.into(),
            source,
        }
    }
}
