//! # error: failure taxonomy for a sync pass
//!
//! Every operation in this crate returns [`SyncError`]. There is no retry and no
//! rollback: any error aborts the pass and the caller is expected to re-run
//! from the cleanup phase.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can abort a sync or prune pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("{method} {path} failed with HTTP {status}: {body}")]
    Http {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },

    /// The server answered, but not with the shape we rely on.
    #[error("protocol mismatch in {context}: {detail}")]
    ProtocolMismatch { context: String, detail: String },

    /// Local input and remote state disagree in a way the pass cannot paper over.
    #[error("inconsistent state: {0}")]
    Inconsistency(String),

    /// A local media file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn protocol(context: impl Into<String>, detail: impl Into<String>) -> Self {
        SyncError::ProtocolMismatch {
            context: context.into(),
            detail: detail.into(),
        }
    }
}
