//! The client and daemon speaking to each other for real.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::thread;

use filedrop_client::{run_command, ClientCommand, ClientError, SOCKET_IO_EXIT_CODE};
use filedrop_daemon::{Daemon, DaemonConfig};
use filedrop_logging::Verbosity;

fn start_daemon(root: &Path) -> String {
    let config = DaemonConfig {
        bind: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        root: root.to_path_buf(),
        verbosity: Verbosity::Quiet,
    };
    let daemon = Daemon::bind(config).expect("bind daemon");
    let address = daemon.local_addr().expect("local addr").to_string();
    thread::spawn(move || daemon.run());
    address
}

#[test]
fn upload_then_download_returns_identical_bytes() {
    let server_root = tempfile::tempdir().expect("server root");
    let client_dir = tempfile::tempdir().expect("client dir");
    let address = start_daemon(server_root.path());

    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 241) as u8).collect();
    let source = client_dir.path().join("source.bin");
    fs::write(&source, &payload).expect("seed source");

    let sent = run_command(
        &address,
        &ClientCommand::Upload {
            local: source,
            remote: "stored.bin".to_owned(),
        },
    )
    .expect("upload");
    assert_eq!(sent, payload.len() as u64);
    assert_eq!(
        fs::read(server_root.path().join("stored.bin")).expect("stored file"),
        payload
    );

    let fetched = client_dir.path().join("fetched.bin");
    let received = run_command(
        &address,
        &ClientCommand::Download {
            remote: "stored.bin".to_owned(),
            local: fetched.clone(),
        },
    )
    .expect("download");
    assert_eq!(received, payload.len() as u64);
    assert_eq!(fs::read(fetched).expect("fetched file"), payload);
}

#[test]
fn zero_byte_upload_creates_an_empty_remote_file() {
    let server_root = tempfile::tempdir().expect("server root");
    let client_dir = tempfile::tempdir().expect("client dir");
    let address = start_daemon(server_root.path());

    let source = client_dir.path().join("empty.bin");
    fs::write(&source, b"").expect("seed source");

    let sent = run_command(
        &address,
        &ClientCommand::Upload {
            local: source,
            remote: "empty.bin".to_owned(),
        },
    )
    .expect("upload");
    assert_eq!(sent, 0);
    assert_eq!(
        fs::metadata(server_root.path().join("empty.bin"))
            .expect("stored file")
            .len(),
        0
    );
}

#[test]
fn download_of_a_missing_remote_file_fails_cleanly() {
    let server_root = tempfile::tempdir().expect("server root");
    let client_dir = tempfile::tempdir().expect("client dir");
    let address = start_daemon(server_root.path());

    let error = run_command(
        &address,
        &ClientCommand::Download {
            remote: "absent.bin".to_owned(),
            local: client_dir.path().join("never.bin"),
        },
    )
    .unwrap_err();

    // The daemon's only failure signal is closing the connection.
    assert_eq!(error.exit_code(), SOCKET_IO_EXIT_CODE);
}

#[test]
fn upload_of_a_missing_local_file_fails_before_connecting() {
    let error = run_command(
        "127.0.0.1:1",
        &ClientCommand::Upload {
            local: "does-not-exist.bin".into(),
            remote: "x.bin".to_owned(),
        },
    )
    .unwrap_err();

    assert!(matches!(error, ClientError::LocalFile { action: "open", .. }));
}
