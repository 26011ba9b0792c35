//! Length-prefixed chunk framing.

use std::io::{Read, Write};

use crate::WireResult;
use crate::error::WireError;

/// Maximum payload bytes a single frame may carry.
pub const CHUNK_SIZE: usize = 128;

/// One unit of transfer: a bounded payload buffer and its valid length.
///
/// A chunk with `len == 0` is the end-of-stream sentinel, both on the wire
/// (the terminator frame) and inside the transfer queue.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    data: [u8; CHUNK_SIZE],
    len: usize,
}

impl Chunk {
    /// Builds a chunk from the leading bytes of `payload`.
    ///
    /// # Panics
    ///
    /// Panics if `payload` is longer than [`CHUNK_SIZE`].
    #[must_use]
    pub fn from_slice(payload: &[u8]) -> Self {
        assert!(payload.len() <= CHUNK_SIZE, "payload exceeds chunk capacity");
        let mut data = [0u8; CHUNK_SIZE];
        data[..payload.len()].copy_from_slice(payload);
        Self {
            data,
            len: payload.len(),
        }
    }

    /// Returns the valid payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Returns the number of valid payload bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the chunk carries no payload.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk").field("len", &self.len).finish()
    }
}

/// Writes one framed chunk: a big-endian `u32` length followed by the
/// payload bytes. Short writes are absorbed by [`Write::write_all`].
pub fn send_chunk<W: Write>(writer: &mut W, payload: &[u8]) -> WireResult<()> {
    assert!(payload.len() <= CHUNK_SIZE, "payload exceeds chunk capacity");
    let length = payload.len() as u32;
    writer.write_all(&length.to_be_bytes())?;
    if !payload.is_empty() {
        writer.write_all(payload)?;
    }
    Ok(())
}

/// Writes the zero-length terminator frame that ends a transfer body.
pub fn send_eof<W: Write>(writer: &mut W) -> WireResult<()> {
    send_chunk(writer, &[])
}

/// Reads one framed chunk.
///
/// Returns `Ok(None)` for the zero-length terminator frame. A length
/// above [`CHUNK_SIZE`] fails with [`WireError::FrameTooLarge`]; a peer
/// close in the middle of the length word or the payload fails with
/// [`WireError::Truncated`].
pub fn recv_chunk<R: Read>(reader: &mut R) -> WireResult<Option<Chunk>> {
    let length = read_u32(reader)?;
    if length == 0 {
        return Ok(None);
    }
    if length as usize > CHUNK_SIZE {
        return Err(WireError::FrameTooLarge {
            length,
            max: CHUNK_SIZE,
        });
    }

    let mut data = [0u8; CHUNK_SIZE];
    reader
        .read_exact(&mut data[..length as usize])
        .map_err(WireError::from_read)?;
    Ok(Some(Chunk {
        data,
        len: length as usize,
    }))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> WireResult<u32> {
    let mut word = [0u8; 4];
    reader.read_exact(&mut word).map_err(WireError::from_read)?;
    Ok(u32::from_be_bytes(word))
}
