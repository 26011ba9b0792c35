//! Parsing of the single client command.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while parsing the command words.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// No command was given.
    #[error("missing command: expected `upload <local> <remote>` or `download <remote> <local>`")]
    Missing,
    /// The command word is not one the client knows.
    #[error("unknown command {0:?}: expected `upload` or `download`")]
    Unknown(String),
    /// The command did not carry exactly two operands.
    #[error("`{command}` takes exactly two operands, got {got}")]
    Operands {
        /// The command word as typed.
        command: String,
        /// Number of operands supplied.
        got: usize,
    },
}

/// The one operation a client invocation performs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCommand {
    /// Send a local file to the server under a remote name.
    Upload {
        /// Local file to read.
        local: PathBuf,
        /// Name the server stores the file under.
        remote: String,
    },
    /// Fetch a remote file into a local path.
    Download {
        /// Name of the file on the server.
        remote: String,
        /// Local file to write.
        local: PathBuf,
    },
}

impl ClientCommand {
    /// Parses command words in the forms `upload <local> <remote>` or
    /// `download <remote> <local>`.
    ///
    /// The command word is matched case-insensitively; what travels on
    /// the wire is always the lowercase form.
    pub fn parse(words: &[String]) -> Result<Self, CommandError> {
        let Some((command, operands)) = words.split_first() else {
            return Err(CommandError::Missing);
        };

        let expect_two = |operands: &[String]| -> Result<(String, String), CommandError> {
            match operands {
                [first, second] => Ok((first.clone(), second.clone())),
                _ => Err(CommandError::Operands {
                    command: command.clone(),
                    got: operands.len(),
                }),
            }
        };

        match command.to_ascii_lowercase().as_str() {
            "upload" => {
                let (local, remote) = expect_two(operands)?;
                Ok(Self::Upload {
                    local: PathBuf::from(local),
                    remote,
                })
            }
            "download" => {
                let (remote, local) = expect_two(operands)?;
                Ok(Self::Download {
                    remote,
                    local: PathBuf::from(local),
                })
            }
            _ => Err(CommandError::Unknown(command.clone())),
        }
    }
}
