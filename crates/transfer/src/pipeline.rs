//! Two-stage transfer pipelines over the bounded chunk queue.

use std::io::{self, Read, Write};
use std::thread;

use filedrop_protocol::{CHUNK_SIZE, Chunk, recv_chunk, send_chunk, send_eof};

use crate::PipelineResult;
use crate::error::PipelineError;
use crate::queue::{self, ChunkReceiver, ChunkSender, DEFAULT_CAPACITY, StreamEnd};

/// Streams `source` onto `wire` as framed chunks, ending with the
/// zero-length terminator frame.
///
/// The reader stage runs on a scoped thread, reading up to
/// [`CHUNK_SIZE`] bytes at a time and enqueueing each non-empty chunk;
/// it finishes the queue on end of file. The calling thread drains the
/// queue onto `wire`. Returns the number of payload bytes sent.
///
/// A read failure aborts the queue so the terminator is never sent: the
/// peer sees the connection drop instead of a stream that pretends to be
/// complete.
pub fn pump_file_to_wire<R, W>(source: &mut R, wire: &mut W) -> PipelineResult<u64>
where
    R: Read + Send,
    W: Write,
{
    thread::scope(|scope| {
        let (sender, mut receiver) = queue::bounded(DEFAULT_CAPACITY);
        let disk = scope.spawn(move || read_stage(source, sender));

        let net_result = send_stage(wire, &mut receiver);
        // Unblock a reader still parked on a full ring before joining it.
        drop(receiver);
        let disk_result = join_stage(disk);

        // A disk failure outranks the queue-abort fallout it causes on
        // the network side.
        let sent = disk_result.map_err(PipelineError::Disk)?;
        net_result?;
        Ok(sent)
    })
}

/// Streams framed chunks from `wire` into `sink` until the terminator
/// frame.
///
/// The calling thread receives frames and enqueues them; the writer
/// stage runs on a scoped thread and writes each chunk fully before
/// taking the next. Returns the number of payload bytes flushed to
/// `sink`.
///
/// When the peer violates the framing or the socket fails, the queue is
/// closed so the writer drains what already arrived and exits; the bytes
/// flushed so far stay in `sink` (no rollback).
pub fn pump_wire_to_file<R, W>(wire: &mut R, sink: &mut W) -> PipelineResult<u64>
where
    R: Read,
    W: Write + Send,
{
    thread::scope(|scope| {
        let (sender, receiver) = queue::bounded(DEFAULT_CAPACITY);
        let disk = scope.spawn(move || write_stage(sink, receiver));

        let net_result = recv_stage(wire, sender);
        let disk_result = join_stage(disk);

        let written = disk_result.map_err(PipelineError::Disk)?;
        net_result?;
        Ok(written)
    })
}

/// Disk side of the send configuration: file → queue.
fn read_stage<R: Read>(source: &mut R, sender: ChunkSender) -> io::Result<u64> {
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buffer) {
            Ok(n) => n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if n > 0 {
            total += n as u64;
            if sender.send(Chunk::from_slice(&buffer[..n])).is_err() {
                // The network side is gone; it reports its own error.
                return Ok(total);
            }
        }
        // A short read means end of file for regular files.
        if n < CHUNK_SIZE {
            sender.finish();
            return Ok(total);
        }
    }
}

/// Network side of the send configuration: queue → wire.
fn send_stage<W: Write>(wire: &mut W, receiver: &mut ChunkReceiver) -> PipelineResult<()> {
    loop {
        match receiver.recv() {
            Ok(chunk) => send_chunk(wire, chunk.as_bytes())?,
            Err(StreamEnd::Complete) => {
                send_eof(wire)?;
                return Ok(());
            }
            // The reader failed; leave the stream unterminated.
            Err(StreamEnd::Aborted) => return Ok(()),
        }
    }
}

/// Network side of the receive configuration: wire → queue.
fn recv_stage<R: Read>(wire: &mut R, sender: ChunkSender) -> PipelineResult<()> {
    loop {
        match recv_chunk(wire) {
            Ok(Some(chunk)) => {
                if sender.send(chunk).is_err() {
                    // The writer failed; its error surfaces from the join.
                    return Ok(());
                }
            }
            Ok(None) => {
                sender.finish();
                return Ok(());
            }
            // Dropping the sender closes the queue as aborted, so the
            // writer drains and exits.
            Err(error) => return Err(error.into()),
        }
    }
}

/// Disk side of the receive configuration: queue → file.
fn write_stage<W: Write>(sink: &mut W, mut receiver: ChunkReceiver) -> io::Result<u64> {
    let mut total = 0u64;
    loop {
        match receiver.recv() {
            Ok(chunk) => {
                sink.write_all(chunk.as_bytes())?;
                total += chunk.len() as u64;
            }
            // Either ending leaves the bytes flushed so far in place.
            Err(StreamEnd::Complete | StreamEnd::Aborted) => return Ok(total),
        }
    }
}

fn join_stage(handle: thread::ScopedJoinHandle<'_, io::Result<u64>>) -> io::Result<u64> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("transfer disk stage panicked")))
}
