//! Per-connection session handling.
//!
//! A session is one client connection from accept to close: read the
//! request header, resolve the file's coordination object, take the lock
//! that matches the command, stream the transfer body, and release
//! everything on the way out. Any failure simply ends the session; the
//! protocol has no error-reply frame, so the peer learns of trouble by
//! the connection closing.

use std::fs::File;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;

use filedrop_filelock::LockRegistry;
use filedrop_protocol::{Command, read_request};
use filedrop_transfer::{pump_file_to_wire, pump_wire_to_file};
use tracing::{debug, info};

use crate::error::SessionError;

/// Serves one client connection to completion.
///
/// Locking discipline: the coordination handle is checked out before the
/// lock is taken, and the guards are dropped in the reverse order (lock
/// first, registry reference second) when the function returns on any
/// path. Header failures return before any lock is taken.
pub(crate) fn serve_connection(
    mut stream: TcpStream,
    root: &Path,
    registry: &Arc<LockRegistry>,
) -> Result<(), SessionError> {
    let request = read_request(&mut stream)?;
    validate_filename(&request.filename)?;
    info!(
        command = request.command.as_wire_str(),
        file = %request.filename,
        "request received"
    );

    let path = root.join(&request.filename);
    let handle = registry.checkout(&request.filename)?;

    match request.command {
        Command::Download => {
            let _guard = handle.read();
            let mut file = File::open(&path).map_err(|source| SessionError::Open {
                path: path.clone(),
                source,
            })?;
            let sent = pump_file_to_wire(&mut file, &mut stream)?;
            debug!(bytes = sent, "download complete");
        }
        Command::Upload => {
            let _guard = handle.write();
            let mut file = File::create(&path).map_err(|source| SessionError::Open {
                path: path.clone(),
                source,
            })?;
            let written = pump_wire_to_file(&mut stream, &mut file)?;
            debug!(bytes = written, "upload complete");
        }
    }

    Ok(())
}

/// Accepts only plain names for files directly inside the served root.
///
/// The wire format cannot carry an empty name past the registry, but a
/// name with a path separator or a relative component would escape the
/// root, so those are refused here before any lock is taken.
fn validate_filename(name: &str) -> Result<(), SessionError> {
    let unsafe_name = name.contains(['/', '\\', '\0']) || name == "." || name == "..";
    if unsafe_name {
        return Err(SessionError::UnsafeFilename(name.to_owned()));
    }
    Ok(())
}
