//! Command-line client for the filedrop transfer daemon.
//!
//! The client performs exactly one transfer per invocation: it connects,
//! sends the request header, then streams the transfer body in framed
//! chunks, outbound for `upload` and inbound for `download`. The daemon
//! never sends an error reply; trouble on the far side shows up here as
//! a premature close or a framing violation.
//!
//! [`run`] is the binary entry point. [`run_command`] is the
//! programmatic surface: it takes a parsed [`ClientCommand`] and an
//! address, and returns the number of payload bytes moved.

mod command;
mod error;

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::net::TcpStream;
use std::process;

use clap::{ArgAction, Parser};
use filedrop_logging::Verbosity;
use filedrop_protocol::{Command, write_request};
use filedrop_transfer::{pump_file_to_wire, pump_wire_to_file};
use tracing::debug;

pub use command::{ClientCommand, CommandError};
pub use error::{
    ClientError, FILE_IO_EXIT_CODE, PROTOCOL_EXIT_CODE, SOCKET_IO_EXIT_CODE, SYNTAX_EXIT_CODE,
};

/// Default TCP port of the daemon.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(
    name = "filedrop",
    version,
    about = "Client for the filedrop transfer daemon",
    disable_help_subcommand = true
)]
struct ClientArgs {
    /// Daemon host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Daemon TCP port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Increase log detail (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Command to run: `upload <local> <remote>` or
    /// `download <remote> <local>`. Prompted for when omitted.
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    command: Vec<String>,
}

/// Executes one parsed command against the daemon at `address`.
///
/// Returns the number of payload bytes moved.
pub fn run_command(address: &str, command: &ClientCommand) -> Result<u64, ClientError> {
    match command {
        ClientCommand::Upload { local, remote } => {
            let mut file = File::open(local).map_err(|source| ClientError::LocalFile {
                action: "open",
                path: local.clone(),
                source,
            })?;
            let mut stream = connect(address)?;
            write_request(&mut stream, Command::Upload, remote)?;
            let sent = pump_file_to_wire(&mut file, &mut stream)?;
            debug!(bytes = sent, file = %remote, "upload sent");

            // The daemon closes the connection once its writer stage has
            // flushed everything; wait for that close so the file is
            // complete when this returns.
            let _ = stream.read_to_end(&mut Vec::new());
            Ok(sent)
        }
        ClientCommand::Download { remote, local } => {
            let mut stream = connect(address)?;
            write_request(&mut stream, Command::Download, remote)?;
            let mut file = File::create(local).map_err(|source| ClientError::LocalFile {
                action: "create",
                path: local.clone(),
                source,
            })?;
            let received = pump_wire_to_file(&mut stream, &mut file)?;
            debug!(bytes = received, file = %remote, "download received");
            Ok(received)
        }
    }
}

fn connect(address: &str) -> Result<TcpStream, ClientError> {
    TcpStream::connect(address).map_err(|source| ClientError::Connect {
        address: address.to_owned(),
        source,
    })
}

/// Entry point for the `filedrop` binary.
///
/// Parses arguments, reads the command interactively when none was
/// given, runs the transfer, and returns a status for
/// [`exit_code_from`].
pub fn run<I, O, E>(args: I, stdout: &mut O, stderr: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    O: Write,
    E: Write,
{
    let args = match ClientArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(error) if error.use_stderr() => {
            let _ = write!(stderr, "{error}");
            return SYNTAX_EXIT_CODE;
        }
        Err(help_or_version) => {
            let _ = write!(stdout, "{help_or_version}");
            return 0;
        }
    };

    filedrop_logging::init(Verbosity::from_flag_count(args.verbose));

    let words = if args.command.is_empty() {
        match prompt_for_command(stdout) {
            Ok(words) => words,
            Err(error) => {
                let _ = writeln!(stderr, "filedrop: {error}");
                return SOCKET_IO_EXIT_CODE;
            }
        }
    } else {
        args.command
    };

    let command = match ClientCommand::parse(&words) {
        Ok(command) => command,
        Err(error) => {
            let _ = writeln!(stderr, "filedrop: {error}");
            return SYNTAX_EXIT_CODE;
        }
    };

    let address = format!("{}:{}", args.host, args.port);
    match run_command(&address, &command) {
        Ok(bytes) => {
            let verb = match command {
                ClientCommand::Upload { .. } => "uploaded",
                ClientCommand::Download { .. } => "downloaded",
            };
            let _ = writeln!(stdout, "filedrop: {verb} {bytes} bytes");
            0
        }
        Err(error) => {
            let _ = writeln!(stderr, "filedrop: {error}");
            error.exit_code()
        }
    }
}

/// Reads one command line from standard input.
fn prompt_for_command<O: Write>(stdout: &mut O) -> std::io::Result<Vec<String>> {
    write!(stdout, "filedrop> ")?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.split_whitespace().map(ToOwned::to_owned).collect())
}

/// Converts a status integer produced by [`run`] into the value handed
/// back to the operating system.
#[must_use]
pub fn exit_code_from(status: i32) -> process::ExitCode {
    process::ExitCode::from(status.clamp(0, i32::from(u8::MAX)) as u8)
}
