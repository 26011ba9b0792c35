//! Runtime options for the daemon.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use filedrop_logging::Verbosity;

/// Default TCP port the daemon listens on.
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(
    name = "filedropd",
    version,
    about = "Chunked file-transfer daemon",
    disable_help_subcommand = true
)]
struct DaemonArgs {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory whose files are served to clients.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Increase log detail (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Validated daemon configuration.
#[derive(Clone, Debug)]
pub struct DaemonConfig {
    /// Address the listener binds.
    pub bind: IpAddr,
    /// TCP port the listener binds.
    pub port: u16,
    /// Directory whose files are served.
    pub root: PathBuf,
    /// Log verbosity for the process.
    pub verbosity: Verbosity,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            root: PathBuf::from("."),
            verbosity: Verbosity::Quiet,
        }
    }
}

impl DaemonConfig {
    /// Parses a daemon configuration from command-line arguments.
    ///
    /// The first argument is the program name, as with
    /// [`std::env::args_os`].
    pub fn parse_from<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = OsString>,
    {
        let args = DaemonArgs::try_parse_from(args)?;
        Ok(Self {
            bind: args.bind,
            port: args.port,
            root: args.root,
            verbosity: Verbosity::from_flag_count(args.verbose),
        })
    }
}
