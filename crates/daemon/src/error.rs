//! Session-level error type.

use std::io;
use std::path::PathBuf;

use filedrop_filelock::RegistryError;
use filedrop_protocol::WireError;
use filedrop_transfer::PipelineError;
use thiserror::Error;

/// Errors that terminate one client session.
///
/// Every variant is terminal for its session only: the socket is closed,
/// any lock and registry reference are released on the way out, and the
/// daemon keeps serving other connections.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request header was malformed or the socket failed while
    /// reading it.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The filename was rejected by the lock registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The filename tried to name something other than a plain file in
    /// the served directory.
    #[error("filename {0:?} is not a plain file name")]
    UnsafeFilename(String),
    /// The served file could not be opened.
    #[error("failed to open {path:?}: {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },
    /// The transfer pipeline failed mid-stream.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
