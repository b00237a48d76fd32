use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("no sidecar engine binary configured or found")]
    NotFound,

    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sidecar pipe error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for `{0}`")]
    Timeout(String),

    #[error("sidecar process exited")]
    Exited,

    #[error("malformed sidecar response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, SidecarError>;
