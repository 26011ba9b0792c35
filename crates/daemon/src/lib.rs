//! The filedropd transfer daemon.
//!
//! `filedropd` accepts TCP connections and serves one transfer per
//! connection: a `download` streams a served file to the client, an
//! `upload` deposits a client-supplied file under the served root.
//! Concurrent sessions on the same filename are arbitrated by a
//! writer-preference reader/writer lock, so downloads share the file
//! while an upload is exclusive.
//!
//! Each connection is handled on its own thread; each active transfer
//! additionally runs its disk stage on a scoped thread, with a bounded
//! chunk queue between disk and socket.

mod config;
mod error;
mod exit_code;
mod session;

use std::ffi::OsString;
use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

use filedrop_filelock::LockRegistry;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{info, info_span, warn};

pub use config::{DEFAULT_PORT, DaemonConfig};
pub use error::SessionError;
pub use exit_code::{ExitCode, exit_code_from};

/// Listen backlog for the daemon socket.
const LISTEN_BACKLOG: i32 = 10;

/// A bound daemon, ready to serve connections.
#[derive(Debug)]
pub struct Daemon {
    listener: TcpListener,
    config: DaemonConfig,
    registry: Arc<LockRegistry>,
}

impl Daemon {
    /// Binds the listener described by `config`.
    ///
    /// The lock registry is created here, before the first connection
    /// can arrive.
    pub fn bind(config: DaemonConfig) -> std::io::Result<Self> {
        let address = SocketAddr::new(config.bind, config.port);
        let domain = if address.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&SockAddr::from(address))?;
        socket.listen(LISTEN_BACKLOG)?;

        Ok(Self {
            listener: socket.into(),
            config,
            registry: Arc::new(LockRegistry::new()),
        })
    }

    /// Returns the address the listener actually bound.
    ///
    /// Useful when the configured port is 0 and the operating system
    /// chose one.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves connections forever.
    ///
    /// Accept failures are logged and the loop continues; a failed
    /// session never takes the daemon down.
    pub fn run(self) {
        info!(root = %self.config.root.display(), "serving");
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(error) => {
                    warn!(%error, "accept failed");
                    continue;
                }
            };

            let root = self.config.root.clone();
            let registry = Arc::clone(&self.registry);
            let spawned = thread::Builder::new()
                .name("filedrop-session".to_owned())
                .spawn(move || {
                    let span = info_span!("session", %peer);
                    let _enter = span.enter();
                    match session::serve_connection(stream, &root, &registry) {
                        Ok(()) => info!("session complete"),
                        Err(error) => warn!(%error, "session failed"),
                    }
                });
            if let Err(error) = spawned {
                warn!(%peer, %error, "failed to spawn session thread");
            }
        }
    }
}

/// Entry point for the `filedropd` binary.
///
/// Parses arguments, installs the tracing subscriber, binds and runs the
/// daemon. Returns a status for [`exit_code_from`]; since the serve loop
/// runs forever, a return always signals a startup failure (or a help or
/// version request).
pub fn run<I, O, E>(args: I, stdout: &mut O, stderr: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    O: Write,
    E: Write,
{
    let config = match DaemonConfig::parse_from(args) {
        Ok(config) => config,
        Err(error) if error.use_stderr() => {
            let _ = write!(stderr, "{error}");
            return ExitCode::Syntax.as_i32();
        }
        Err(help_or_version) => {
            let _ = write!(stdout, "{help_or_version}");
            return ExitCode::Ok.as_i32();
        }
    };

    filedrop_logging::init(config.verbosity);

    let daemon = match Daemon::bind(config) {
        Ok(daemon) => daemon,
        Err(error) => {
            let _ = writeln!(stderr, "filedropd: failed to bind listener: {error}");
            return ExitCode::SocketIo.as_i32();
        }
    };
    if let Ok(address) = daemon.local_addr() {
        let _ = writeln!(stdout, "filedropd: listening on {address}");
    }

    daemon.run();
    ExitCode::Ok.as_i32()
}
