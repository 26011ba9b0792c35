//! Error type for transfer pipelines.

use std::io;

use filedrop_protocol::WireError;
use thiserror::Error;

/// Errors produced by a transfer pipeline.
///
/// The two variants keep the failure domains apart: [`Disk`] is the
/// filesystem side of the pipeline, [`Wire`] is the socket side
/// (including protocol violations by the peer).
///
/// [`Disk`]: PipelineError::Disk
/// [`Wire`]: PipelineError::Wire
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading from or writing to the file failed.
    #[error("file I/O failed: {0}")]
    Disk(#[source] io::Error),
    /// Socket I/O failed or the peer violated the framing.
    #[error(transparent)]
    Wire(#[from] WireError),
}
