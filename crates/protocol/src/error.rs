//! Error types for wire encoding and decoding.

use std::io;

use thiserror::Error;

/// Errors produced while reading or writing protocol data.
#[derive(Debug, Error)]
pub enum WireError {
    /// A frame announced a payload larger than the chunk cap.
    #[error("frame length {length} exceeds the {max}-byte chunk limit")]
    FrameTooLarge {
        /// Length field decoded from the wire.
        length: u32,
        /// Maximum payload bytes a frame may carry.
        max: usize,
    },
    /// A request-header length field fell outside its permitted range.
    #[error("{field} length {length} outside {min}..={max}")]
    HeaderField {
        /// Which header field was malformed.
        field: &'static str,
        /// Length decoded from the wire.
        length: u32,
        /// Smallest permitted value.
        min: u32,
        /// Largest permitted value.
        max: u32,
    },
    /// A header string was not valid UTF-8.
    #[error("{field} bytes are not valid UTF-8")]
    InvalidUtf8 {
        /// Which header field was malformed.
        field: &'static str,
    },
    /// The command string is not one the protocol defines.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    /// The peer closed the connection in the middle of a frame or header.
    #[error("connection closed mid-frame")]
    Truncated,
    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
}

impl WireError {
    /// Folds `UnexpectedEof` into [`WireError::Truncated`] so callers see
    /// one error for every flavour of peer-close-mid-read.
    pub(crate) fn from_read(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(error)
        }
    }
}
