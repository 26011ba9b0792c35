//! Client-side error type and exit-code mapping.

use std::io;
use std::path::PathBuf;

use filedrop_protocol::WireError;
use filedrop_transfer::PipelineError;
use thiserror::Error;

use crate::command::CommandError;

/// Exit code for command-line usage errors.
pub const SYNTAX_EXIT_CODE: i32 = 1;
/// Exit code for protocol violations by the server.
pub const PROTOCOL_EXIT_CODE: i32 = 2;
/// Exit code for socket I/O failures.
pub const SOCKET_IO_EXIT_CODE: i32 = 10;
/// Exit code for local file I/O failures.
pub const FILE_IO_EXIT_CODE: i32 = 11;

/// Errors surfaced by a client invocation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The command words were unusable.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Connecting to the daemon failed.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Address the client tried to reach.
        address: String,
        /// Underlying socket error.
        source: io::Error,
    },
    /// A local file could not be opened or created.
    #[error("failed to {action} {path:?}: {source}")]
    LocalFile {
        /// What the client was doing, for the diagnostic.
        action: &'static str,
        /// Local path involved.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },
    /// The wire protocol failed outside a transfer body.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The transfer body failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ClientError {
    /// Maps the error onto the process exit code contract.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command(_) => SYNTAX_EXIT_CODE,
            Self::Connect { .. } => SOCKET_IO_EXIT_CODE,
            Self::LocalFile { .. } => FILE_IO_EXIT_CODE,
            Self::Wire(error) => wire_exit_code(error),
            Self::Pipeline(PipelineError::Disk(_)) => FILE_IO_EXIT_CODE,
            Self::Pipeline(PipelineError::Wire(error)) => wire_exit_code(error),
        }
    }
}

fn wire_exit_code(error: &WireError) -> i32 {
    match error {
        WireError::Io(_) | WireError::Truncated => SOCKET_IO_EXIT_CODE,
        WireError::FrameTooLarge { .. }
        | WireError::HeaderField { .. }
        | WireError::InvalidUtf8 { .. }
        | WireError::UnknownCommand(_) => PROTOCOL_EXIT_CODE,
    }
}
