//! Streaming pipeline for filedrop transfers.
//!
//! A transfer moves file bytes between a disk file and a socket through a
//! bounded single-producer/single-consumer chunk queue. The queue
//! decouples disk I/O from network I/O: a slow peer backpressures the
//! disk stage at the queue's depth instead of stalling it outright, and
//! a slow disk never leaves the socket stage spinning.
//!
//! Two configurations exist, one per transfer direction:
//!
//! - [`pump_file_to_wire`]: a reader stage feeds the queue from a file
//!   while the calling thread drains it onto the socket as framed
//!   chunks, ending with the zero-length terminator frame.
//! - [`pump_wire_to_file`]: the calling thread feeds the queue from
//!   framed chunks on the socket while a writer stage drains it into a
//!   file.
//!
//! The disk stage always runs on a scoped thread spawned per transfer;
//! the network stage runs on the caller (the session thread).

mod error;
mod pipeline;
pub mod queue;

pub use error::PipelineError;
pub use pipeline::{pump_file_to_wire, pump_wire_to_file};

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
