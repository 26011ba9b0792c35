//! Wire protocol for the filedrop transfer service.
//!
//! Everything that crosses the TCP connection is defined here: the framed
//! chunk encoding used by transfer bodies and the request header a client
//! sends immediately after connecting. All integers on the wire are
//! big-endian.
//!
//! A transfer body is a sequence of frames, each a 4-byte length followed
//! by that many payload bytes, terminated by a zero-length frame:
//!
//! ```text
//! +----------------+------------------+
//! | u32 n (1..128) | n payload bytes  |
//! +----------------+------------------+
//! ...
//! +----------------+
//! | u32 0          |
//! +----------------+
//! ```
//!
//! The framing deliberately caps payloads at [`CHUNK_SIZE`] bytes: the cap
//! bounds the memory held per in-flight chunk and doubles as a sanity
//! filter against corrupted length fields.

mod error;
mod frame;
mod request;

pub use error::WireError;
pub use frame::{CHUNK_SIZE, Chunk, recv_chunk, send_chunk, send_eof};
pub use request::{
    Command, MAX_COMMAND_FIELD, MAX_NAME_FIELD, Request, read_request, write_request,
};

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;
