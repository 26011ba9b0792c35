//! End-to-end tests driving a live daemon over TCP.

use std::fs;
use std::io::{Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use filedrop_daemon::{Daemon, DaemonConfig};
use filedrop_logging::Verbosity;

/// Binds a daemon on an ephemeral port over a temporary root and leaves
/// it serving on a background thread for the rest of the process.
fn start_daemon(root: &Path) -> SocketAddr {
    let config = DaemonConfig {
        bind: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        root: root.to_path_buf(),
        verbosity: Verbosity::Quiet,
    };
    let daemon = Daemon::bind(config).expect("bind daemon");
    let address = daemon.local_addr().expect("local addr");
    thread::spawn(move || daemon.run());
    address
}

fn send_header(stream: &mut TcpStream, command: &str, filename: &str) {
    let mut header = Vec::new();
    header.extend_from_slice(&((command.len() + 1) as u32).to_be_bytes());
    header.extend_from_slice(command.as_bytes());
    header.push(0);
    header.extend_from_slice(&((filename.len() + 1) as u32).to_be_bytes());
    header.extend_from_slice(filename.as_bytes());
    header.push(0);
    stream.write_all(&header).expect("send header");
}

fn send_frame(stream: &mut TcpStream, payload: &[u8]) {
    stream
        .write_all(&(payload.len() as u32).to_be_bytes())
        .expect("send frame length");
    stream.write_all(payload).expect("send frame payload");
}

/// Reads frames until the terminator and returns the concatenated
/// payload bytes.
fn read_body(stream: &mut TcpStream) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut word = [0u8; 4];
        stream.read_exact(&mut word).expect("frame length");
        let length = u32::from_be_bytes(word) as usize;
        if length == 0 {
            return body;
        }
        assert!(length <= 128, "daemon sent an oversized frame");
        let mut payload = vec![0u8; length];
        stream.read_exact(&mut payload).expect("frame payload");
        body.extend_from_slice(&payload);
    }
}

fn read_until_close(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    // A reset counts as a close here: some scenarios make the daemon
    // drop the connection with client bytes still in flight.
    let _ = stream.read_to_end(&mut rest);
    rest
}

fn wait_for_file_len(path: &Path, expected: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if fs::metadata(path).is_ok_and(|meta| meta.len() == expected) {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "file {path:?} never reached {expected} bytes"
        );
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn simple_download_streams_the_file() {
    let root = tempfile::tempdir().expect("root");
    fs::write(root.path().join("hello.txt"), b"hello world").expect("seed file");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "download", "hello.txt");

    assert_eq!(read_body(&mut stream), b"hello world");
    assert!(read_until_close(&mut stream).is_empty());
}

#[test]
fn upload_of_200_bytes_lands_byte_for_byte() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let payload: Vec<u8> = (0..200u32).map(|i| (i * 7 % 256) as u8).collect();
    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "upload", "x.bin");
    send_frame(&mut stream, &payload[..128]);
    send_frame(&mut stream, &payload[128..]);
    send_frame(&mut stream, &[]);

    // The daemon closes the connection once the writer stage is done.
    assert!(read_until_close(&mut stream).is_empty());
    assert_eq!(fs::read(root.path().join("x.bin")).expect("stored file"), payload);
}

#[test]
fn upload_of_an_empty_body_creates_an_empty_file() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "upload", "empty.bin");
    send_frame(&mut stream, &[]);

    assert!(read_until_close(&mut stream).is_empty());
    assert_eq!(
        fs::metadata(root.path().join("empty.bin"))
            .expect("stored file")
            .len(),
        0
    );
}

#[test]
fn uploaded_file_downloads_back_unchanged() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let payload: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    let mut upload = TcpStream::connect(address).expect("connect");
    send_header(&mut upload, "upload", "roundtrip.bin");
    for part in payload.chunks(128) {
        send_frame(&mut upload, part);
    }
    send_frame(&mut upload, &[]);
    assert!(read_until_close(&mut upload).is_empty());

    let mut download = TcpStream::connect(address).expect("connect");
    send_header(&mut download, "download", "roundtrip.bin");
    assert_eq!(read_body(&mut download), payload);
}

#[test]
fn concurrent_downloads_share_the_file() {
    let root = tempfile::tempdir().expect("root");
    let payload: Vec<u8> = (0..1024 * 1024u32).map(|i| (i % 253) as u8).collect();
    fs::write(root.path().join("stable.dat"), &payload).expect("seed file");
    let address = start_daemon(root.path());

    let mut clients = Vec::new();
    for _ in 0..2 {
        let expected = payload.clone();
        clients.push(thread::spawn(move || {
            let mut stream = TcpStream::connect(address).expect("connect");
            send_header(&mut stream, "download", "stable.dat");
            assert_eq!(read_body(&mut stream), expected);
        }));
    }
    for client in clients {
        client.join().expect("download client");
    }
}

#[test]
fn oversized_chunk_aborts_the_upload() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "upload", "attack.bin");
    // Announce a 200-byte chunk, well past the 128-byte cap.
    stream
        .write_all(&200u32.to_be_bytes())
        .expect("bogus length");
    let _ = stream.write_all(&[0u8; 200]);

    // The daemon drops the connection without writing any payload.
    assert!(read_until_close(&mut stream).is_empty());
    wait_for_file_len(&root.path().join("attack.bin"), 0);
}

#[test]
fn disconnect_mid_upload_keeps_the_flushed_prefix() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "upload", "partial.bin");
    send_frame(&mut stream, &[0x5au8; 128]);
    drop(stream);

    // The writer stage drains what arrived and exits; no rollback.
    wait_for_file_len(&root.path().join("partial.bin"), 128);
    assert_eq!(
        fs::read(root.path().join("partial.bin")).expect("stored file"),
        [0x5au8; 128]
    );
}

#[test]
fn unknown_command_closes_the_connection() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "delete", "hello.txt");

    assert!(read_until_close(&mut stream).is_empty());
}

#[test]
fn uppercase_command_is_not_accepted() {
    let root = tempfile::tempdir().expect("root");
    fs::write(root.path().join("hello.txt"), b"hello world").expect("seed file");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "DOWNLOAD", "hello.txt");

    // Case-exact matching: the daemon closes without sending a body.
    assert!(read_until_close(&mut stream).is_empty());
}

#[test]
fn path_escaping_names_are_refused() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "upload", "../escape.bin");
    // The daemon may already have hung up on the bad name.
    let _ = stream.write_all(&4u32.to_be_bytes());
    let _ = stream.write_all(b"nope");

    let _ = read_until_close(&mut stream);
    assert!(!root.path().join("..").join("escape.bin").exists());
}

#[test]
fn download_of_a_missing_file_just_closes() {
    let root = tempfile::tempdir().expect("root");
    let address = start_daemon(root.path());

    let mut stream = TcpStream::connect(address).expect("connect");
    send_header(&mut stream, "download", "absent.bin");

    assert!(read_until_close(&mut stream).is_empty());
}
