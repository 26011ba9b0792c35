//! Request header encoding and decoding.
//!
//! A client sends exactly one request header after connecting: a
//! length-prefixed command string followed by a length-prefixed filename,
//! both NUL-terminated with the NUL counted in the length. The legacy
//! string commands are the compatibility contract; nothing else is
//! accepted.

use std::io::{Read, Write};

use crate::WireResult;
use crate::error::WireError;
use crate::frame::read_u32;

/// Largest permitted value of the command length field (NUL included).
pub const MAX_COMMAND_FIELD: u32 = 31;

/// Largest permitted value of the filename length field (NUL included).
///
/// Admits a filename of up to 255 bytes plus its terminator.
pub const MAX_NAME_FIELD: u32 = 256;

/// The two operations a client may request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Retrieve a server-side file.
    Download,
    /// Deposit a client-supplied file under a server-side name.
    Upload,
}

impl Command {
    /// Returns the case-exact string that represents this command on the
    /// wire, without its trailing NUL.
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }

    fn from_wire_str(text: &str) -> WireResult<Self> {
        match text {
            "download" => Ok(Self::Download),
            "upload" => Ok(Self::Upload),
            other => Err(WireError::UnknownCommand(other.to_owned())),
        }
    }
}

/// A parsed request header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    /// The requested operation.
    pub command: Command,
    /// The server-side filename the operation applies to.
    pub filename: String,
}

/// Reads and validates a request header.
///
/// Length fields outside their ranges fail with
/// [`WireError::HeaderField`]; an unrecognized command string fails with
/// [`WireError::UnknownCommand`]; a peer close before the header is
/// complete fails with [`WireError::Truncated`].
pub fn read_request<R: Read>(reader: &mut R) -> WireResult<Request> {
    let command_text = read_string_field(reader, "command", MAX_COMMAND_FIELD)?;
    let command = Command::from_wire_str(&command_text)?;
    let filename = read_string_field(reader, "filename", MAX_NAME_FIELD)?;
    Ok(Request { command, filename })
}

/// Writes a request header for `command` on `filename`.
///
/// The counterpart of [`read_request`]; used by the client side.
pub fn write_request<W: Write>(writer: &mut W, command: Command, filename: &str) -> WireResult<()> {
    write_string_field(writer, command.as_wire_str())?;
    write_string_field(writer, filename)
}

fn read_string_field<R: Read>(reader: &mut R, field: &'static str, max: u32) -> WireResult<String> {
    let length = read_u32(reader)?;
    if length < 1 || length > max {
        return Err(WireError::HeaderField {
            field,
            length,
            min: 1,
            max,
        });
    }

    let mut bytes = vec![0u8; length as usize];
    reader
        .read_exact(&mut bytes)
        .map_err(WireError::from_read)?;
    // The terminator is counted in the length field; drop exactly one.
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { field })
}

fn write_string_field<W: Write>(writer: &mut W, text: &str) -> WireResult<()> {
    let length = (text.len() + 1) as u32;
    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(text.as_bytes())?;
    writer.write_all(&[0])?;
    Ok(())
}
