//! Centralized exit code definitions shared by the binaries.
//!
//! Both `filedropd` and `filedrop` report failures through these codes
//! so scripts can tell a usage mistake from a protocol violation or an
//! I/O failure.

use std::process;

/// Exit codes returned by filedrop programs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion.
    Ok = 0,
    /// Syntax or usage error in the command line.
    Syntax = 1,
    /// The peer violated the wire protocol.
    Protocol = 2,
    /// Error in socket I/O.
    SocketIo = 10,
    /// Error in file I/O.
    FileIo = 11,
}

impl ExitCode {
    /// Returns the numeric value of this exit code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a short human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Protocol => "protocol violation",
            Self::SocketIo => "error in socket I/O",
            Self::FileIo => "error in file I/O",
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.as_i32().clamp(0, i32::from(u8::MAX)) as u8)
    }
}

/// Converts a status integer produced by a `run` entry point into the
/// value handed back to the operating system.
#[must_use]
pub fn exit_code_from(status: i32) -> process::ExitCode {
    process::ExitCode::from(status.clamp(0, i32::from(u8::MAX)) as u8)
}
